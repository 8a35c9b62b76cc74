use std::io::{Cursor, Read};

use super::common::utils::{read_blob, read_length, read_string};
use super::common::intset;
use super::ValueState;
use crate::types::{Event, Key, RdbResult};

/// A plain set: a count followed by that many members.
pub(crate) struct LinkedSet {
    remaining: i64,
}

impl LinkedSet {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let len = read_length(input)?;
        Ok((
            Event::SetStart { key, len },
            ValueState::Set(LinkedSet { remaining: len }),
        ))
    }

    pub fn step<R: Read>(&mut self, input: &mut R) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let member = read_string(input)?;
        self.remaining -= 1;
        Ok(Some(Event::SetElement(member)))
    }
}

/// A set of integers packed into a width-tagged array.
pub(crate) struct IntSet {
    reader: Cursor<Vec<u8>>,
    width: u32,
    remaining: u32,
}

impl IntSet {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let data = read_blob(input)?;
        let mut reader = Cursor::new(data);
        let (width, length) = intset::read_header(&mut reader)?;

        Ok((
            Event::SetStart {
                key,
                len: length as i64,
            },
            ValueState::IntSet(IntSet {
                reader,
                width,
                remaining: length,
            }),
        ))
    }

    pub fn step(&mut self) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let member = intset::read_element(&mut self.reader, self.width)?;
        self.remaining -= 1;
        Ok(Some(Event::SetElement(member)))
    }
}
