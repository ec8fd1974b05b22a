//! CRC-8 used by both the command frames and the telemetry frame.
//!
//! Polynomial 0x07, initial value 0x00, MSB-first, no final XOR. This is the
//! catalogued CRC-8/SMBUS algorithm, so the `crc` crate's table-driven
//! implementation is used instead of a bitwise loop.

use crc::{Crc, CRC_8_SMBUS};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Checksum of `data`.
#[inline]
#[must_use]
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}
