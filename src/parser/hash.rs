use std::collections::VecDeque;
use std::io::{Cursor, Read};

use byteorder::ReadBytesExt;

use super::common::utils::{read_blob, read_length, read_string};
use super::common::{ziplist, zipmap};
use super::ValueState;
use crate::types::{Event, Key, RdbResult, RdbString};

const ZIPMAP_END: u8 = 0xFF;

/// A plain hash: a count followed by that many field/value string pairs.
pub(crate) struct Hash {
    remaining: i64,
}

impl Hash {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let len = read_length(input)?;
        Ok((
            Event::HashStart { key, len },
            ValueState::Hash(Hash { remaining: len }),
        ))
    }

    pub fn step<R: Read>(&mut self, input: &mut R) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let field = read_string(input)?;
        let value = read_string(input)?;
        self.remaining -= 1;
        Ok(Some(Event::HashElement { field, value }))
    }
}

/// A hash stored as a ziplist of alternating field and value entries.
pub(crate) struct ZiplistHash {
    reader: Cursor<Vec<u8>>,
    remaining: u16,
}

impl ZiplistHash {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let data = read_blob(input)?;
        let mut reader = Cursor::new(data);
        let (_zlbytes, _zltail, zllen) = ziplist::read_header(&mut reader)?;
        let pairs = zllen / 2;

        Ok((
            Event::HashStart {
                key,
                len: pairs as i64,
            },
            ValueState::HashZiplist(ZiplistHash {
                reader,
                remaining: pairs,
            }),
        ))
    }

    pub fn step(&mut self) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let field = ziplist::read_entry(&mut self.reader)?;
        let value = ziplist::read_entry(&mut self.reader)?;
        self.remaining -= 1;
        Ok(Some(Event::HashElement { field, value }))
    }
}

/// A hash in the legacy zipmap layout (Redis < 2.6).
///
/// A stored length byte below 254 is trusted and entries stream out as
/// they are scanned. 254 and up means the real count is unknown, so the
/// whole map is scanned first and replayed from a queue, keeping the
/// metadata-before-elements contract with an accurate count.
pub(crate) struct Zipmap {
    reader: Cursor<Vec<u8>>,
}

impl Zipmap {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let data = read_blob(input)?;
        let mut reader = Cursor::new(data);
        let map_len = reader.read_u8()?;

        if map_len < 254 {
            return Ok((
                Event::HashStart {
                    key,
                    len: map_len as i64,
                },
                ValueState::Zipmap(Zipmap { reader }),
            ));
        }

        let mut entries = VecDeque::new();
        loop {
            let next_byte = reader.read_u8()?;
            if next_byte == ZIPMAP_END {
                break;
            }
            let (field, value) = zipmap::read_pair(&mut reader, next_byte)?;
            entries.push_back(Event::HashElement {
                field: RdbString::Bytes(field),
                value: RdbString::Bytes(value),
            });
        }

        Ok((
            Event::HashStart {
                key,
                len: entries.len() as i64,
            },
            ValueState::Drain(entries),
        ))
    }

    pub fn step(&mut self) -> RdbResult<Option<Event>> {
        let next_byte = self.reader.read_u8()?;
        if next_byte == ZIPMAP_END {
            return Ok(None);
        }
        let (field, value) = zipmap::read_pair(&mut self.reader, next_byte)?;
        Ok(Some(Event::HashElement {
            field: RdbString::Bytes(field),
            value: RdbString::Bytes(value),
        }))
    }
}
