use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use super::utils::read_exact;
use crate::types::RdbResult;

/// Reads a zipmap element length. The first byte was already consumed by
/// the caller; 253 escapes to a four-byte little-endian length.
pub fn read_element_length<R: Read>(input: &mut R, first: u8) -> RdbResult<i64> {
    if first == 253 {
        Ok(input.read_u32::<LittleEndian>()? as i64)
    } else {
        Ok(first as i64)
    }
}

/// Reads one field/value pair. `first` is the already-consumed first byte
/// of the field length. The value carries a "free" byte counting padding
/// to discard after the value payload.
pub fn read_pair<R: Read>(input: &mut R, first: u8) -> RdbResult<(Vec<u8>, Vec<u8>)> {
    let field_len = read_element_length(input, first)?;
    let field = read_exact(input, field_len as usize)?;

    let next_byte = input.read_u8()?;
    let value_len = read_element_length(input, next_byte)?;
    let free = input.read_u8()?;
    let value = read_exact(input, value_len as usize)?;

    if free > 0 {
        read_exact(input, free as usize)?;
    }

    Ok((field, value))
}
