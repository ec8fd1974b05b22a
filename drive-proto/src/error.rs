//! Error types shared by the frame codecs.

/// Why a received frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Trailing checksum does not match the frame contents.
    Checksum,
    /// Input slice is not the size of the frame.
    Length,
    /// Missing `0xAA 0x55` preamble.
    Sync,
    /// Unknown frame type or payload length field.
    Type,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Length => write!(f, "bad frame length"),
            Self::Sync => write!(f, "missing sync bytes"),
            Self::Type => write!(f, "unknown frame type"),
        }
    }
}

/// Error from the host-side link decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The receive buffer is full; drain messages before feeding more bytes.
    BufferFull,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferFull => write!(f, "decoder buffer full"),
        }
    }
}
