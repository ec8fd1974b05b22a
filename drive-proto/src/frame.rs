//! Fixed 4-byte command/response frame.
//!
//! ```text
//! [ HDR | D0 | D1 | CRC8 ]
//! HDR bit7 = 1:read / 0:write, bits6..0 = register address
//! Write:        D0 = value low byte, D1 = value high byte
//! Read request: D0 = burst count,    D1 = flags
//! ```
//!
//! Read replies are sent back as write frames, one per register.

use crate::crc::crc8;
use crate::register::MAX_ADDRESS;
use crate::FrameError;

/// Size of a command frame on the wire.
pub const FRAME_LEN: usize = 4;

/// Header bit selecting a read request.
pub const READ_FLAG: u8 = 0x80;

/// Direction of a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    Write,
}

/// A checksum-valid command frame, minus the checksum byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    pub header: u8,
    pub data0: u8,
    pub data1: u8,
}

/// Build a header byte from an access direction and address.
#[inline]
#[must_use]
pub const fn make_header(access: Access, address: u8) -> u8 {
    let rw = match access {
        Access::Read => READ_FLAG,
        Access::Write => 0,
    };
    rw | (address & MAX_ADDRESS)
}

impl CommandFrame {
    /// Frame writing a signed 16-bit value to `address`.
    #[must_use]
    pub const fn write(address: u8, value: i16) -> Self {
        let [lo, hi] = value.to_le_bytes();
        Self {
            header: make_header(Access::Write, address),
            data0: lo,
            data1: hi,
        }
    }

    /// Frame requesting `count` consecutive registers starting at `address`.
    #[must_use]
    pub const fn read_burst(address: u8, count: u8, flags: u8) -> Self {
        Self {
            header: make_header(Access::Read, address),
            data0: count,
            data1: flags,
        }
    }

    #[inline]
    #[must_use]
    pub const fn access(&self) -> Access {
        if self.header & READ_FLAG != 0 {
            Access::Read
        } else {
            Access::Write
        }
    }

    #[inline]
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.header & MAX_ADDRESS
    }

    /// Payload interpreted as a little-endian signed value (write frames).
    #[inline]
    #[must_use]
    pub const fn value(&self) -> i16 {
        i16::from_le_bytes([self.data0, self.data1])
    }

    /// Burst count (read frames).
    #[inline]
    #[must_use]
    pub const fn burst_count(&self) -> u8 {
        self.data0
    }

    /// Flags byte (read frames).
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.data1
    }

    /// Checksum over header, data0 and data1.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        crc8(&[self.header, self.data0, self.data1])
    }

    /// Serialize with a freshly computed checksum.
    #[must_use]
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        [self.header, self.data0, self.data1, self.checksum()]
    }

    /// Validate the checksum of a raw frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Checksum`] when the trailing byte does not match.
    pub fn decode(raw: &[u8; FRAME_LEN]) -> Result<Self, FrameError> {
        let frame = Self {
            header: raw[0],
            data0: raw[1],
            data1: raw[2],
        };
        if frame.checksum() != raw[3] {
            return Err(FrameError::Checksum);
        }
        Ok(frame)
    }
}
