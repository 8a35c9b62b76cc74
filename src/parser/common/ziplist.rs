use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use super::utils::read_exact;
use crate::types::{RdbError, RdbResult, RdbString};

/// Reads the ziplist header and returns `(zlbytes, zltail, zllen)`.
///
/// Only the element count matters to the decoder; the trailing 0xFF
/// sentinel is never consulted, iteration stops after `zllen` entries.
pub fn read_header<R: Read>(input: &mut R) -> RdbResult<(u32, u32, u16)> {
    let zlbytes = input.read_u32::<LittleEndian>()?;
    let zltail = input.read_u32::<LittleEndian>()?;
    let zllen = input.read_u16::<LittleEndian>()?;

    Ok((zlbytes, zltail, zllen))
}

/// Reads one ziplist entry: the previous-entry length (discarded), the
/// encoding flag, and the payload.
pub fn read_entry<R: Read>(input: &mut R) -> RdbResult<RdbString> {
    // 1 or 5 bytes length of previous entry, value unused
    let byte = input.read_u8()?;
    if byte == 0xFE {
        let _ = input.read_u32::<LittleEndian>()?;
    } else if byte == 0xFF {
        return Err(RdbError::UnexpectedPrevLengthEntryByte(byte));
    }

    let flag = input.read_u8()?;

    let length = match (flag & 0xC0) >> 6 {
        0 => (flag & 0x3F) as usize,
        1 => {
            let next_byte = input.read_u8()?;
            (((flag & 0x3F) as usize) << 8) | next_byte as usize
        }
        2 => input.read_u32::<LittleEndian>()? as usize,
        _ => {
            return match (flag & 0xF0) >> 4 {
                0xC => Ok(RdbString::Int16(input.read_i16::<LittleEndian>()?)),
                0xD => Ok(RdbString::Int32(input.read_i32::<LittleEndian>()?)),
                0xE => Ok(RdbString::Int64(input.read_i64::<LittleEndian>()?)),
                _ => match flag & 0x0F {
                    0x0 => {
                        let bytes = read_exact(input, 3)?;
                        let raw = (bytes[0] as i32)
                            | ((bytes[1] as i32) << 8)
                            | ((bytes[2] as i32) << 16);
                        // Sign-extend from 24 bits
                        Ok(RdbString::Int32((raw << 8) >> 8))
                    }
                    0xE => Ok(RdbString::Int8(input.read_i8()?)),
                    nibble @ 1..=13 => Ok(RdbString::Int16(nibble as i16 - 1)),
                    _ => Err(RdbError::UnknownLengthEncoding(flag)),
                },
            };
        }
    };

    Ok(RdbString::Bytes(read_exact(input, length)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Cursor;

    #[test]
    fn test_read_header() {
        let data = vec![
            0x20, 0x00, 0x00, 0x00, // zlbytes
            0x1A, 0x00, 0x00, 0x00, // zltail
            0x05, 0x00, // zllen
        ];
        let (zlbytes, zltail, zllen) = read_header(&mut Cursor::new(data)).unwrap();
        assert_eq!(zlbytes, 32);
        assert_eq!(zltail, 26);
        assert_eq!(zllen, 5);
    }

    #[rstest]
    #[case(&[0x00, 0x01, b'c'], RdbString::Bytes(vec![b'c']))]
    #[case(&[0x05, 0xC0, 0xE8, 0x03], RdbString::Int16(1000))]
    #[case(&[0x05, 0xD0, 0xA5, 0x7B, 0xEE, 0x0A], RdbString::Int32(183358245))]
    #[case(&[0x05, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], RdbString::Int64(-1))]
    #[case(&[0x05, 0xFE, 0x9C], RdbString::Int8(-100))]
    #[case(&[0x05, 0xF1], RdbString::Int16(0))]
    #[case(&[0x05, 0xFD], RdbString::Int16(12))]
    fn test_read_entry(#[case] input: &[u8], #[case] expected: RdbString) {
        let mut cursor = Cursor::new(Vec::from(input));
        assert_eq!(expected, read_entry(&mut cursor).unwrap());
    }

    #[test]
    fn test_read_entry_24bit_negative() {
        // -2 as little-endian 24-bit two's complement
        let data = vec![0x05, 0xF0, 0xFE, 0xFF, 0xFF];
        assert_eq!(
            read_entry(&mut Cursor::new(data)).unwrap(),
            RdbString::Int32(-2)
        );
    }

    #[test]
    fn test_read_entry_24bit_positive() {
        // 0x0A0B0C little-endian
        let data = vec![0x05, 0xF0, 0x0C, 0x0B, 0x0A];
        assert_eq!(
            read_entry(&mut Cursor::new(data)).unwrap(),
            RdbString::Int32(0x0A0B0C)
        );
    }

    #[test]
    fn test_read_entry_14bit_string_length() {
        let mut data = vec![0x05, 0x40 | 0x01, 0x04];
        data.extend_from_slice(&[b'x'; 260]);
        assert_eq!(
            read_entry(&mut Cursor::new(data)).unwrap(),
            RdbString::Bytes(vec![b'x'; 260])
        );
    }

    #[test]
    fn test_read_entry_long_prev_length() {
        // 0xFE prev-length marker followed by four discarded bytes
        let data = vec![0xFE, 0xAA, 0xBB, 0xCC, 0xDD, 0x01, b'y'];
        assert_eq!(
            read_entry(&mut Cursor::new(data)).unwrap(),
            RdbString::Bytes(vec![b'y'])
        );
    }

    #[test]
    fn test_read_entry_bad_prev_length() {
        let data = vec![0xFF, 0x01, b'y'];
        assert!(matches!(
            read_entry(&mut Cursor::new(data)),
            Err(RdbError::UnexpectedPrevLengthEntryByte(0xFF))
        ));
    }

    #[test]
    fn test_read_entry_invalid_flag() {
        let data = vec![0x05, 0xFF];
        assert!(matches!(
            read_entry(&mut Cursor::new(data)),
            Err(RdbError::UnknownLengthEncoding(0xFF))
        ));
    }
}
