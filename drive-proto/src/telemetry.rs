//! Device-to-host telemetry frame.
//!
//! Fixed 37-byte little-endian layout, no padding:
//!
//! ```text
//! 0      0xAA
//! 1      0x55
//! 2      type   = 0x01
//! 3      length = 32 (payload bytes 4..36)
//! 4..8   u32  timestamp_ms
//! 8..20  3 x f32 acceleration x,y,z (mm/s^2)
//! 20..32 3 x f32 angular rate x,y,z (rad/s)
//! 32..36 f32  speed (m/s, signed by commanded direction)
//! 36     crc8 over bytes 0..36
//! ```

use crate::crc::crc8;
use crate::FrameError;

pub const SYNC: [u8; 2] = [0xAA, 0x55];
pub const TELEMETRY_TYPE: u8 = 0x01;
pub const PAYLOAD_LEN: u8 = 32;
/// Total encoded size including sync, header and checksum.
pub const TELEMETRY_FRAME_LEN: usize = 37;

const HEADER_LEN: usize = 4;
const CRC_POS: usize = TELEMETRY_FRAME_LEN - 1;

/// One telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryFrame {
    pub timestamp_ms: u32,
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    pub speed: f32,
}

impl TelemetryFrame {
    /// Serialize into the wire layout with a trailing checksum.
    #[must_use]
    pub fn encode(&self) -> [u8; TELEMETRY_FRAME_LEN] {
        let mut out = [0u8; TELEMETRY_FRAME_LEN];
        out[..2].copy_from_slice(&SYNC);
        out[2] = TELEMETRY_TYPE;
        out[3] = PAYLOAD_LEN;

        let mut pos = HEADER_LEN;
        let mut put = |bytes: [u8; 4]| {
            out[pos..pos + 4].copy_from_slice(&bytes);
            pos += 4;
        };
        put(self.timestamp_ms.to_le_bytes());
        for v in self.accel.iter().chain(self.gyro.iter()) {
            put(v.to_le_bytes());
        }
        put(self.speed.to_le_bytes());

        out[CRC_POS] = crc8(&out[..CRC_POS]);
        out
    }

    /// Parse a complete frame.
    ///
    /// # Errors
    ///
    /// - [`FrameError::Length`] if `raw` is not exactly 37 bytes
    /// - [`FrameError::Sync`] if the preamble is wrong
    /// - [`FrameError::Type`] if the type or length field is unexpected
    /// - [`FrameError::Checksum`] if the trailing byte does not match
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() != TELEMETRY_FRAME_LEN {
            return Err(FrameError::Length);
        }
        if raw[..2] != SYNC {
            return Err(FrameError::Sync);
        }
        if raw[2] != TELEMETRY_TYPE || raw[3] != PAYLOAD_LEN {
            return Err(FrameError::Type);
        }
        if crc8(&raw[..CRC_POS]) != raw[CRC_POS] {
            return Err(FrameError::Checksum);
        }

        let word = |i: usize| {
            let at = HEADER_LEN + 4 * i;
            [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]
        };
        let float = |i: usize| f32::from_le_bytes(word(i));

        Ok(Self {
            timestamp_ms: u32::from_le_bytes(word(0)),
            accel: [float(1), float(2), float(3)],
            gyro: [float(4), float(5), float(6)],
            speed: float(7),
        })
    }
}
