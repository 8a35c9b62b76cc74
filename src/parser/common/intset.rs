use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::types::{RdbError, RdbResult, RdbString};

/// Reads the intset header and returns `(width, length)` where `width` is
/// the number of bytes per integer (2, 4 or 8).
pub fn read_header<R: Read>(input: &mut R) -> RdbResult<(u32, u32)> {
    let width = input.read_u32::<LittleEndian>()?;
    match width {
        2 | 4 | 8 => {}
        other => return Err(RdbError::UnknownValueType(other)),
    }

    let length = input.read_u32::<LittleEndian>()?;
    Ok((width, length))
}

/// Reads one integer of the stated width, preserving it.
pub fn read_element<R: Read>(input: &mut R, width: u32) -> RdbResult<RdbString> {
    match width {
        2 => Ok(RdbString::Int16(input.read_i16::<LittleEndian>()?)),
        4 => Ok(RdbString::Int32(input.read_i32::<LittleEndian>()?)),
        _ => Ok(RdbString::Int64(input.read_i64::<LittleEndian>()?)),
    }
}
