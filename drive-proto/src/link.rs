//! Host-side decoder for the device-to-host byte stream.
//!
//! The device emits two kinds of frames on the same link: 37-byte telemetry
//! frames starting with `0xAA 0x55`, and 4-byte write frames carrying register
//! values in reply to read requests. Unlike the device-side command parser,
//! this decoder resynchronizes: whenever the bytes at the front of the buffer
//! cannot start a valid frame, it drops one byte and tries again.
//!
//! # Example
//!
//! ```
//! use drive_proto::{CommandFrame, LinkDecoder, LinkMessage};
//!
//! let mut decoder: LinkDecoder = LinkDecoder::new();
//! decoder.extend(&[0x13]).unwrap(); // line noise
//! decoder.extend(&CommandFrame::write(0x01, -300).encode()).unwrap();
//!
//! assert_eq!(
//!     decoder.next_message(),
//!     Some(LinkMessage::Register { address: 0x01, value: -300 })
//! );
//! assert_eq!(decoder.next_message(), None);
//! ```

use heapless::Vec;

use crate::frame::{Access, CommandFrame, FRAME_LEN, READ_FLAG};
use crate::telemetry::{TelemetryFrame, SYNC, TELEMETRY_FRAME_LEN};
use crate::DecodeError;

/// Default receive buffer size: room for several telemetry frames.
pub const DEFAULT_LINK_BUFFER: usize = 256;

/// A frame recovered from the device stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMessage {
    Telemetry(TelemetryFrame),
    Register { address: u8, value: i16 },
}

/// Resynchronizing stream decoder backed by a fixed-capacity buffer.
pub struct LinkDecoder<const N: usize = DEFAULT_LINK_BUFFER> {
    buffer: Vec<u8, N>,
    dropped: u32,
}

impl<const N: usize> LinkDecoder<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            dropped: 0,
        }
    }

    /// Append received bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::BufferFull`] if `data` does not fit; nothing is
    /// appended in that case.
    pub fn extend(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        self.buffer
            .extend_from_slice(data)
            .map_err(|()| DecodeError::BufferFull)
    }

    /// Number of buffered, not yet decoded bytes.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes discarded while resynchronizing since creation.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Decode the next complete frame, if one is buffered.
    ///
    /// Returns `None` once the buffer holds only an incomplete frame prefix.
    pub fn next_message(&mut self) -> Option<LinkMessage> {
        loop {
            let first = *self.buffer.first()?;

            if first == SYNC[0] {
                let second = *self.buffer.get(1)?;
                if second != SYNC[1] {
                    self.drop_front(1);
                    continue;
                }
                if self.buffer.len() < TELEMETRY_FRAME_LEN {
                    return None;
                }
                match TelemetryFrame::decode(&self.buffer[..TELEMETRY_FRAME_LEN]) {
                    Ok(frame) => {
                        self.consume(TELEMETRY_FRAME_LEN);
                        return Some(LinkMessage::Telemetry(frame));
                    }
                    Err(_) => self.drop_front(1),
                }
            } else if first & READ_FLAG == 0 {
                if self.buffer.len() < FRAME_LEN {
                    return None;
                }
                let raw = [
                    self.buffer[0],
                    self.buffer[1],
                    self.buffer[2],
                    self.buffer[3],
                ];
                match CommandFrame::decode(&raw) {
                    Ok(frame) if frame.access() == Access::Write => {
                        self.consume(FRAME_LEN);
                        return Some(LinkMessage::Register {
                            address: frame.address(),
                            value: frame.value(),
                        });
                    }
                    _ => self.drop_front(1),
                }
            } else {
                self.drop_front(1);
            }
        }
    }

    fn drop_front(&mut self, n: usize) {
        self.consume(n);
        self.dropped = self.dropped.wrapping_add(n as u32);
    }

    fn consume(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.copy_within(n.., 0);
        self.buffer.truncate(self.buffer.len() - n);
    }
}

impl<const N: usize> Default for LinkDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}
