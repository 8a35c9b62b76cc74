use std::fmt;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// A value read from a string slot in the dump.
///
/// RDB stores "strings" either as raw bytes or as one of several packed
/// integer encodings. The wire encoding is preserved so that consumers can
/// tell an integer-encoded key apart from its textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum RdbString {
    Bytes(Vec<u8>),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
}

impl RdbString {
    /// Number of payload bytes this value occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            RdbString::Bytes(b) => b.len(),
            RdbString::Int8(_) => 1,
            RdbString::Int16(_) => 2,
            RdbString::Int32(_) => 4,
            RdbString::Int64(_) => 8,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RdbString::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for RdbString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdbString::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            RdbString::Int8(v) => write!(f, "{}", v),
            RdbString::Int16(v) => write!(f, "{}", v),
            RdbString::Int32(v) => write!(f, "{}", v),
            RdbString::Int64(v) => write!(f, "{}", v),
        }
    }
}

impl From<&[u8]> for RdbString {
    fn from(bytes: &[u8]) -> Self {
        RdbString::Bytes(bytes.to_vec())
    }
}

/// A key together with its optional expiry time in milliseconds since the
/// Unix epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub value: RdbString,
    pub expiry: Option<i64>,
}

impl Key {
    pub fn new(value: RdbString, expiry: Option<i64>) -> Key {
        Key { value, expiry }
    }

    /// Whether the key's expiry time lies in the past. Keys without an
    /// expiry never expire. Expired keys are still emitted by the parser;
    /// dropping them is the consumer's call.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            None => false,
            Some(at) => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as i64)
                    .unwrap_or(0);
                at < now
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A single decoded record fragment, in file order.
///
/// Composite types are delivered as a `*Start` event carrying the declared
/// element count, followed by exactly that many element events. `Database`
/// events enclose all records of the selected database.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Database(u8),
    String { key: Key, value: RdbString },
    ListStart { key: Key, len: i64 },
    ListElement(RdbString),
    SetStart { key: Key, len: i64 },
    SetElement(RdbString),
    SortedSetStart { key: Key, len: i64 },
    SortedSetElement { value: RdbString, score: f64 },
    HashStart { key: Key, len: i64 },
    HashElement { field: RdbString, value: RdbString },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Database(_) => EventKind::Database,
            Event::String { .. } => EventKind::String,
            Event::ListStart { .. } => EventKind::ListStart,
            Event::ListElement(_) => EventKind::ListElement,
            Event::SetStart { .. } => EventKind::SetStart,
            Event::SetElement(_) => EventKind::SetElement,
            Event::SortedSetStart { .. } => EventKind::SortedSetStart,
            Event::SortedSetElement { .. } => EventKind::SortedSetElement,
            Event::HashStart { .. } => EventKind::HashStart,
            Event::HashElement { .. } => EventKind::HashElement,
        }
    }
}

/// The kinds of [`Event`] a consumer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Database,
    String,
    ListStart,
    ListElement,
    SetStart,
    SetElement,
    SortedSetStart,
    SortedSetElement,
    HashStart,
    HashElement,
}

#[derive(Debug, Error)]
pub enum RdbError {
    #[error("invalid magic string")]
    InvalidMagic,

    #[error("invalid RDB version number")]
    InvalidVersion,

    #[error("unexpected encoded length")]
    UnexpectedEncodedLength,

    #[error("unknown value type: {0}")]
    UnknownValueType(u32),

    #[error("unknown length encoding: {0:#04x}")]
    UnknownLengthEncoding(u8),

    #[error("unexpected prev length entry byte: {0:#04x}")]
    UnexpectedPrevLengthEntryByte(u8),

    #[error("checksum mismatch: expected {expected:#018x}, found {actual:#018x}")]
    InvalidChecksum { expected: u64, actual: u64 },

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("malformed double: {0:?}")]
    MalformedDouble(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for RdbError {
    fn from(e: io::Error) -> RdbError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RdbError::UnexpectedEof
        } else {
            RdbError::Io(e)
        }
    }
}

pub type RdbResult<T> = Result<T, RdbError>;

pub type RdbOk = RdbResult<()>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_tracks_wire_width() {
        assert_eq!(RdbString::Bytes(b"foobar".to_vec()).encoded_len(), 6);
        assert_eq!(RdbString::Int8(-1).encoded_len(), 1);
        assert_eq!(RdbString::Int16(300).encoded_len(), 2);
        assert_eq!(RdbString::Int32(70_000).encoded_len(), 4);
        assert_eq!(RdbString::Int64(1 << 40).encoded_len(), 8);
    }

    #[test]
    fn test_display_covers_all_variants() {
        assert_eq!(RdbString::Bytes(b"abc".to_vec()).to_string(), "abc");
        assert_eq!(RdbString::Int8(-5).to_string(), "-5");
        assert_eq!(RdbString::Int16(32764).to_string(), "32764");
        assert_eq!(RdbString::Int32(183358245).to_string(), "183358245");
        assert_eq!(RdbString::Int64(-1).to_string(), "-1");
    }

    #[test]
    fn test_key_expiry() {
        let alive = Key::new(RdbString::from(&b"a"[..]), None);
        assert!(!alive.is_expired());

        // 2100-01-01T00:00:00Z
        let future = Key::new(RdbString::from(&b"a"[..]), Some(4_102_444_800_000));
        assert!(!future.is_expired());

        let past = Key::new(RdbString::from(&b"a"[..]), Some(1_000));
        assert!(past.is_expired());
    }

    #[test]
    fn test_eof_io_error_is_folded() {
        let e = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(RdbError::from(e), RdbError::UnexpectedEof));

        let e = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(RdbError::from(e), RdbError::Io(_)));
    }
}
