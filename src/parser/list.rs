use std::io::{Cursor, Read};

use super::common::utils::{read_blob, read_length, read_string};
use super::common::ziplist;
use super::ValueState;
use crate::types::{Event, Key, RdbResult};

/// A plain list: a count followed by that many string slots.
pub(crate) struct LinkedList {
    remaining: i64,
}

impl LinkedList {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let len = read_length(input)?;
        Ok((
            Event::ListStart { key, len },
            ValueState::List(LinkedList { remaining: len }),
        ))
    }

    pub fn step<R: Read>(&mut self, input: &mut R) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let value = read_string(input)?;
        self.remaining -= 1;
        Ok(Some(Event::ListElement(value)))
    }
}

/// A list stored as a ziplist inside a single string slot.
pub(crate) struct ZiplistList {
    reader: Cursor<Vec<u8>>,
    remaining: u16,
}

impl ZiplistList {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let data = read_blob(input)?;
        let mut reader = Cursor::new(data);
        let (_zlbytes, _zltail, zllen) = ziplist::read_header(&mut reader)?;

        Ok((
            Event::ListStart {
                key,
                len: zllen as i64,
            },
            ValueState::ListZiplist(ZiplistList {
                reader,
                remaining: zllen,
            }),
        ))
    }

    pub fn step(&mut self) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let entry = ziplist::read_entry(&mut self.reader)?;
        self.remaining -= 1;
        Ok(Some(Event::ListElement(entry)))
    }
}
