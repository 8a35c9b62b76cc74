//! The framing state machine and the event iterator built on top of it.

pub mod common;
mod hash;
mod list;
mod set;
mod sorted_set;

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use self::common::utils::{read_string, verify_magic, verify_version};
use crate::checksum::Crc64Reader;
use crate::constants::{encoding_type, op_code};
use crate::filter::Subscription;
use crate::types::{Event, Key, RdbError, RdbResult};

/// First RDB version whose files end in a CRC64 trailer.
const CHECKSUM_MIN_VERSION: u32 = 5;

/// Where the parser currently is inside a key's value.
pub(crate) enum ValueState {
    Top,
    List(list::LinkedList),
    ListZiplist(list::ZiplistList),
    Set(set::LinkedSet),
    IntSet(set::IntSet),
    SortedSet(sorted_set::SortedSet),
    SortedSetZiplist(sorted_set::ZiplistSortedSet),
    Hash(hash::Hash),
    HashZiplist(hash::ZiplistHash),
    Zipmap(hash::Zipmap),
    Drain(VecDeque<Event>),
}

/// A streaming RDB parser.
///
/// Built by [`crate::parse`]; iterate it to receive [`Event`]s in file
/// order. Composite values are decoded lazily, one element per step, so
/// large dumps never have to fit in memory. After the first error the
/// iterator is exhausted.
pub struct RdbParser<R: Read, S: Subscription> {
    input: Crc64Reader<R>,
    subscription: S,
    version: u32,
    state: ValueState,
    done: bool,
}

impl<R: Read, S: Subscription> RdbParser<R, S> {
    /// Wraps `input` and verifies the magic string and version digits.
    pub fn new(input: R, subscription: S) -> RdbResult<RdbParser<R, S>> {
        let mut input = Crc64Reader::new(input);
        verify_magic(&mut input)?;
        let version = verify_version(&mut input)?;

        Ok(RdbParser {
            input,
            subscription,
            version,
            state: ValueState::Top,
            done: false,
        })
    }

    /// The version parsed from the header.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Produces the next event regardless of subscription, or `None` once
    /// the end-of-file byte (and trailer, when present) was consumed.
    fn advance(&mut self) -> RdbResult<Option<Event>> {
        match &mut self.state {
            ValueState::Top => {}
            ValueState::Drain(queue) => {
                if let Some(event) = queue.pop_front() {
                    return Ok(Some(event));
                }
                self.state = ValueState::Top;
            }
            other => {
                let stepped = match other {
                    ValueState::List(s) => s.step(&mut self.input)?,
                    ValueState::ListZiplist(s) => s.step()?,
                    ValueState::Set(s) => s.step(&mut self.input)?,
                    ValueState::IntSet(s) => s.step()?,
                    ValueState::SortedSet(s) => s.step(&mut self.input)?,
                    ValueState::SortedSetZiplist(s) => s.step()?,
                    ValueState::Hash(s) => s.step(&mut self.input)?,
                    ValueState::HashZiplist(s) => s.step()?,
                    ValueState::Zipmap(s) => s.step()?,
                    ValueState::Top | ValueState::Drain(_) => unreachable!(),
                };
                match stepped {
                    Some(event) => return Ok(Some(event)),
                    None => self.state = ValueState::Top,
                }
            }
        }

        let next_op = self.input.read_u8()?;
        match next_op {
            op_code::SELECTDB => {
                let db_index = self.input.read_u8()?;
                log::debug!("switching to database {}", db_index);
                Ok(Some(Event::Database(db_index)))
            }
            op_code::EOF => {
                self.verify_trailer()?;
                Ok(None)
            }
            op_code::EXPIRETIME => {
                let seconds = self.input.read_u32::<LittleEndian>()?;
                let type_byte = self.input.read_u8()?;
                self.begin_record(type_byte, Some(seconds as i64 * 1000))
            }
            op_code::EXPIRETIME_MS => {
                let millis = self.input.read_i64::<LittleEndian>()?;
                let type_byte = self.input.read_u8()?;
                self.begin_record(type_byte, Some(millis))
            }
            type_byte => self.begin_record(type_byte, None),
        }
    }

    /// Reads the key and dispatches to the value decoder for `type_byte`,
    /// leaving any composite state armed for subsequent steps.
    fn begin_record(&mut self, type_byte: u8, expiry: Option<i64>) -> RdbResult<Option<Event>> {
        let key = Key::new(read_string(&mut self.input)?, expiry);

        let (event, state) = match type_byte {
            encoding_type::STRING => {
                let value = read_string(&mut self.input)?;
                (Event::String { key, value }, ValueState::Top)
            }
            encoding_type::LIST => list::LinkedList::begin(&mut self.input, key)?,
            encoding_type::SET => set::LinkedSet::begin(&mut self.input, key)?,
            encoding_type::ZSET => sorted_set::SortedSet::begin(&mut self.input, key)?,
            encoding_type::HASH => hash::Hash::begin(&mut self.input, key)?,
            encoding_type::HASH_ZIPMAP => hash::Zipmap::begin(&mut self.input, key)?,
            encoding_type::LIST_ZIPLIST => list::ZiplistList::begin(&mut self.input, key)?,
            encoding_type::SET_INTSET => set::IntSet::begin(&mut self.input, key)?,
            encoding_type::ZSET_ZIPLIST => {
                sorted_set::ZiplistSortedSet::begin(&mut self.input, key)?
            }
            encoding_type::HASH_ZIPLIST => hash::ZiplistHash::begin(&mut self.input, key)?,
            other => return Err(RdbError::UnknownValueType(other as u32)),
        };

        self.state = state;
        Ok(Some(event))
    }

    /// Checks the CRC64 trailer of version 5+ files.
    ///
    /// The running checksum is captured before the trailer bytes are read,
    /// so it covers exactly the bytes the writer checksummed. A stream
    /// ending cleanly right after the EOF byte carries no trailer and
    /// passes; an all-zero trailer means the writer disabled checksumming.
    fn verify_trailer(&mut self) -> RdbResult<()> {
        if self.version < CHECKSUM_MIN_VERSION {
            return Ok(());
        }

        let expected = self.input.checksum();

        let mut trailer = [0u8; 8];
        let mut filled = 0;
        while filled < trailer.len() {
            match self.input.read(&mut trailer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Ok(());
        }
        if filled < trailer.len() {
            return Err(RdbError::UnexpectedEof);
        }

        let actual = u64::from_le_bytes(trailer);
        if actual != 0 && actual != expected {
            return Err(RdbError::InvalidChecksum { expected, actual });
        }

        Ok(())
    }
}

impl<R: Read, S: Subscription> Iterator for RdbParser<R, S> {
    type Item = RdbResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.advance() {
                Ok(Some(event)) => {
                    if self.subscription.wants(event.kind()) {
                        return Some(Ok(event));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
