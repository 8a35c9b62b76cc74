//! CRC64 (Jones variant) over everything read from the input.

use std::io::{self, Read};

const CRC_POLYNOMIAL: u64 = 0x95AC_9329_AC4B_C9B5;

const fn make_crc_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut j = 0;
        while j < 8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ CRC_POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u64; 256] = make_crc_table();

/// Computes the CRC64 of `data` with initial state 0 and no final xor.
///
/// This is the value Redis appends (little-endian) after the EOF byte of
/// version 5+ dumps.
pub fn crc64(data: &[u8]) -> u64 {
    update(0, data)
}

fn update(mut crc: u64, data: &[u8]) -> u64 {
    for &byte in data {
        let index = (crc ^ byte as u64) & 0xFF;
        crc = (crc >> 8) ^ CRC_TABLE[index as usize];
    }
    crc
}

/// A reader adapter folding every delivered byte into a running CRC64.
///
/// The parser compares [`Crc64Reader::checksum`] against the stored trailer
/// right before reading the trailer bytes themselves.
pub struct Crc64Reader<R> {
    inner: R,
    checksum: u64,
}

impl<R: Read> Crc64Reader<R> {
    pub fn new(inner: R) -> Crc64Reader<R> {
        Crc64Reader { inner, checksum: 0 }
    }

    /// The CRC64 of all bytes read so far.
    pub fn checksum(&self) -> u64 {
        self.checksum
    }
}

impl<R: Read> Read for Crc64Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.checksum = update(self.checksum, &buf[..n]);
        Ok(n)
    }
}
