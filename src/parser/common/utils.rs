use std::io::Read;
use std::str;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use super::lzf;
use crate::constants::{constant, encoding, version};
use crate::types::{RdbError, RdbResult, RdbString};

/// Reads a length field, returning the value and whether it is one of the
/// special string-encoding discriminators (top bits `11`).
pub fn read_length_with_encoding<R: Read>(input: &mut R) -> RdbResult<(i64, bool)> {
    let enc_type = input.read_u8()?;

    let (length, is_encoded) = match (enc_type & 0xC0) >> 6 {
        constant::RDB_ENCVAL => ((enc_type & 0x3F) as i64, true),
        constant::RDB_6BITLEN => ((enc_type & 0x3F) as i64, false),
        constant::RDB_14BITLEN => {
            let next_byte = input.read_u8()?;
            ((((enc_type & 0x3F) as i64) << 8) | next_byte as i64, false)
        }
        _ => (input.read_u32::<BigEndian>()? as i64, false),
    };

    Ok((length, is_encoded))
}

/// Reads a length in a context where only a plain count is legal.
pub fn read_length<R: Read>(input: &mut R) -> RdbResult<i64> {
    let (length, is_encoded) = read_length_with_encoding(input)?;
    if is_encoded {
        return Err(RdbError::UnexpectedEncodedLength);
    }
    Ok(length)
}

pub fn verify_magic<R: Read>(input: &mut R) -> RdbResult<()> {
    let mut magic = [0; 5];
    input
        .read_exact(&mut magic)
        .map_err(|_| RdbError::InvalidMagic)?;

    if magic == constant::RDB_MAGIC.as_bytes() {
        Ok(())
    } else {
        Err(RdbError::InvalidMagic)
    }
}

/// Reads the four ASCII version digits and returns the parsed version.
pub fn verify_version<R: Read>(input: &mut R) -> RdbResult<u32> {
    let mut buf = [0u8; 4];
    input
        .read_exact(&mut buf)
        .map_err(|_| RdbError::InvalidVersion)?;

    if buf.iter().any(|b| !b.is_ascii_digit()) {
        return Err(RdbError::InvalidVersion);
    }

    let version = str::from_utf8(&buf)
        .expect("ascii digits")
        .parse::<u32>()
        .map_err(|_| RdbError::InvalidVersion)?;

    if !(version::SUPPORTED_MINIMUM..=version::SUPPORTED_MAXIMUM).contains(&version) {
        return Err(RdbError::InvalidVersion);
    }

    Ok(version)
}

/// Reads a string slot: raw length-prefixed bytes, a packed integer or an
/// LZF-compressed blob. The wire encoding survives in the returned value.
pub fn read_string<R: Read>(input: &mut R) -> RdbResult<RdbString> {
    let (length, is_encoded) = read_length_with_encoding(input)?;

    if !is_encoded {
        return Ok(RdbString::Bytes(read_exact(input, length as usize)?));
    }

    match length as u8 {
        encoding::INT8 => Ok(RdbString::Int8(input.read_i8()?)),
        encoding::INT16 => Ok(RdbString::Int16(input.read_i16::<LittleEndian>()?)),
        encoding::INT32 => Ok(RdbString::Int32(input.read_i32::<LittleEndian>()?)),
        encoding::LZF => {
            let compressed_length = read_length(input)?;
            let real_length = read_length(input)?;
            let data = read_exact(input, compressed_length as usize)?;
            Ok(RdbString::Bytes(lzf::decompress(
                &data,
                real_length as usize,
            )?))
        }
        other => Err(RdbError::UnknownLengthEncoding(other)),
    }
}

/// Reads a string slot that must hold raw bytes, such as the serialized
/// form of a ziplist, zipmap or intset.
pub fn read_blob<R: Read>(input: &mut R) -> RdbResult<Vec<u8>> {
    match read_string(input)? {
        RdbString::Bytes(data) => Ok(data),
        _ => Err(RdbError::UnexpectedEncodedLength),
    }
}

/// Reads a score: a one-byte length with sentinels for the infinities and
/// NaN, otherwise that many ASCII bytes parsed as a double.
pub fn read_double<R: Read>(input: &mut R) -> RdbResult<f64> {
    let score_length = input.read_u8()?;
    match score_length {
        255 => Ok(f64::NEG_INFINITY),
        254 => Ok(f64::INFINITY),
        253 => Ok(f64::NAN),
        _ => {
            let raw = read_exact(input, score_length as usize)?;
            str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| {
                    RdbError::MalformedDouble(String::from_utf8_lossy(&raw).into_owned())
                })
        }
    }
}

pub fn read_exact<R: Read>(input: &mut R, len: usize) -> RdbResult<Vec<u8>> {
    let mut buf = vec![0; len];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Cursor;

    #[rstest]
    #[case(&[0x0], (0, false), 1)]
    #[case(&[0x3f], (63, false), 1)]
    #[case(&[0x7f, 0xff], (16383, false), 2)]
    #[case(&[0x80, 0xff, 0xff, 0xff, 0xff], (4294967295, false), 5)]
    #[case(&[0xC0], (0, true), 1)]
    #[case(&[0xC3], (3, true), 1)]
    fn test_read_length(
        #[case] input: &[u8],
        #[case] expected: (i64, bool),
        #[case] expected_position: u64,
    ) {
        let mut cursor = Cursor::new(Vec::from(input));
        assert_eq!(expected, read_length_with_encoding(&mut cursor).unwrap());
        assert_eq!(expected_position, cursor.position());
    }

    #[test]
    fn test_read_length_rejects_encoded_discriminator() {
        let result = read_length(&mut Cursor::new(vec![0xC0]));
        assert!(matches!(result, Err(RdbError::UnexpectedEncodedLength)));
    }

    #[test]
    fn test_read_string_raw() {
        assert_eq!(
            RdbString::Bytes(vec![0x61, 0x62, 0x63, 0x64]),
            read_string(&mut Cursor::new(vec![4, 0x61, 0x62, 0x63, 0x64])).unwrap()
        );
    }

    #[rstest]
    #[case(&[0xC0, 0x7B], RdbString::Int8(123))]
    #[case(&[0xC0, 0x80], RdbString::Int8(-128))]
    #[case(&[0xC1, 0x39, 0x30], RdbString::Int16(12345))]
    #[case(&[0xC2, 0xA5, 0x7B, 0xEE, 0x0A], RdbString::Int32(183358245))]
    fn test_read_string_integer_widths(#[case] input: &[u8], #[case] expected: RdbString) {
        let mut cursor = Cursor::new(Vec::from(input));
        assert_eq!(expected, read_string(&mut cursor).unwrap());
    }

    #[test]
    fn test_read_string_lzf() {
        // 0xC3, clen=9, ulen=259 (14-bit form), then the compressed block
        let mut input = vec![0xC3, 9, 0x41, 0x03];
        input.extend_from_slice(&[1, 97, 97, 224, 246, 0, 1, 97, 97]);

        let result = read_string(&mut Cursor::new(input)).unwrap();
        assert_eq!(result, RdbString::Bytes(vec![b'a'; 259]));
    }

    #[test]
    fn test_read_string_unknown_discriminator() {
        let result = read_string(&mut Cursor::new(vec![0xC4]));
        assert!(matches!(result, Err(RdbError::UnknownLengthEncoding(4))));
    }

    #[test]
    fn test_read_blob_rejects_packed_integer() {
        let result = read_blob(&mut Cursor::new(vec![0xC0, 0x01]));
        assert!(matches!(result, Err(RdbError::UnexpectedEncodedLength)));
    }

    #[rstest]
    #[case(&[255], f64::NEG_INFINITY)]
    #[case(&[254], f64::INFINITY)]
    #[case(&[4, b'3', b'.', b'1', b'4'], 3.14)]
    #[case(&[2, b'-', b'7'], -7.0)]
    fn test_read_double(#[case] input: &[u8], #[case] expected: f64) {
        let mut cursor = Cursor::new(Vec::from(input));
        assert_eq!(expected, read_double(&mut cursor).unwrap());
    }

    #[test]
    fn test_read_double_nan() {
        assert!(read_double(&mut Cursor::new(vec![253])).unwrap().is_nan());
    }

    #[test]
    fn test_read_double_malformed() {
        let result = read_double(&mut Cursor::new(vec![3, b'a', b'b', b'c']));
        assert!(matches!(result, Err(RdbError::MalformedDouble(_))));
    }

    #[test]
    fn test_verify_magic() {
        assert!(verify_magic(&mut Cursor::new(b"REDIS".to_vec())).is_ok());
        assert!(matches!(
            verify_magic(&mut Cursor::new(b"QEDIS".to_vec())),
            Err(RdbError::InvalidMagic)
        ));
        assert!(matches!(
            verify_magic(&mut Cursor::new(b"RED".to_vec())),
            Err(RdbError::InvalidMagic)
        ));
    }

    #[rstest]
    #[case(b"0001", Some(1))]
    #[case(b"0006", Some(6))]
    #[case(b"0007", None)]
    #[case(b"0000", None)]
    #[case(b"000:", None)]
    fn test_verify_version(#[case] input: &[u8], #[case] expected: Option<u32>) {
        let result = verify_version(&mut Cursor::new(input.to_vec()));
        match expected {
            Some(v) => assert_eq!(v, result.unwrap()),
            None => assert!(matches!(result, Err(RdbError::InvalidVersion))),
        }
    }

    #[test]
    fn test_read_exact_eof() {
        let result = read_exact(&mut Cursor::new(vec![1, 2]), 4);
        assert!(matches!(result, Err(RdbError::UnexpectedEof)));
    }
}
