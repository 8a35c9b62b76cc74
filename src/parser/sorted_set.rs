use std::io::{Cursor, Read};
use std::str;

use super::common::utils::{read_blob, read_double, read_length, read_string};
use super::common::ziplist;
use super::ValueState;
use crate::types::{Event, Key, RdbError, RdbResult, RdbString};

/// A plain sorted set: a count followed by member/score pairs, the score
/// in the one-byte-length double format.
pub(crate) struct SortedSet {
    remaining: i64,
}

impl SortedSet {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let len = read_length(input)?;
        Ok((
            Event::SortedSetStart { key, len },
            ValueState::SortedSet(SortedSet { remaining: len }),
        ))
    }

    pub fn step<R: Read>(&mut self, input: &mut R) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let value = read_string(input)?;
        let score = read_double(input)?;
        self.remaining -= 1;
        Ok(Some(Event::SortedSetElement { value, score }))
    }
}

/// A sorted set stored as a ziplist of alternating member and score
/// entries. The declared length is halved to count pairs.
pub(crate) struct ZiplistSortedSet {
    reader: Cursor<Vec<u8>>,
    remaining: u16,
}

impl ZiplistSortedSet {
    pub fn begin<R: Read>(input: &mut R, key: Key) -> RdbResult<(Event, ValueState)> {
        let data = read_blob(input)?;
        let mut reader = Cursor::new(data);
        let (_zlbytes, _zltail, zllen) = ziplist::read_header(&mut reader)?;
        let pairs = zllen / 2;

        Ok((
            Event::SortedSetStart {
                key,
                len: pairs as i64,
            },
            ValueState::SortedSetZiplist(ZiplistSortedSet {
                reader,
                remaining: pairs,
            }),
        ))
    }

    pub fn step(&mut self) -> RdbResult<Option<Event>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let value = ziplist::read_entry(&mut self.reader)?;
        let score = score_from(ziplist::read_entry(&mut self.reader)?)?;
        self.remaining -= 1;
        Ok(Some(Event::SortedSetElement { value, score }))
    }
}

/// Converts a ziplist entry used in score position to a double. Integer
/// entries widen; byte entries must parse as a decimal number.
fn score_from(entry: RdbString) -> RdbResult<f64> {
    match entry {
        RdbString::Bytes(raw) => str::from_utf8(&raw)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| RdbError::MalformedDouble(String::from_utf8_lossy(&raw).into_owned())),
        RdbString::Int8(v) => Ok(v as f64),
        RdbString::Int16(v) => Ok(v as f64),
        RdbString::Int32(v) => Ok(v as f64),
        RdbString::Int64(v) => Ok(v as f64),
    }
}
