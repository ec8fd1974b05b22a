//! Byte-at-a-time command frame parser.
//!
//! ```text
//! AwaitHeader -> AwaitData0 -> AwaitData1 -> AwaitChecksum -> AwaitHeader
//! ```
//!
//! Every byte advances exactly one transition. A frame whose checksum does
//! not match is dropped and the parser returns to `AwaitHeader`; it does not
//! search for a new frame boundary, so after a lost byte it stays misaligned
//! until the sender pauses long enough for stale frames to fail checksum.

use drive_proto::CommandFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    #[default]
    AwaitHeader,
    AwaitData0,
    AwaitData1,
    AwaitChecksum,
}

#[derive(Debug, Default)]
pub struct CommandParser {
    state: ParserState,
    header: u8,
    data0: u8,
    data1: u8,
    rejected: u32,
}

impl CommandParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::AwaitHeader,
            header: 0,
            data0: 0,
            data1: 0,
            rejected: 0,
        }
    }

    /// Feed one byte. Returns the frame completed by this byte, if its
    /// checksum is valid.
    pub fn push(&mut self, byte: u8) -> Option<CommandFrame> {
        match self.state {
            ParserState::AwaitHeader => {
                self.header = byte;
                self.state = ParserState::AwaitData0;
                None
            }
            ParserState::AwaitData0 => {
                self.data0 = byte;
                self.state = ParserState::AwaitData1;
                None
            }
            ParserState::AwaitData1 => {
                self.data1 = byte;
                self.state = ParserState::AwaitChecksum;
                None
            }
            ParserState::AwaitChecksum => {
                self.state = ParserState::AwaitHeader;
                let frame = CommandFrame {
                    header: self.header,
                    data0: self.data0,
                    data1: self.data1,
                };
                if frame.checksum() == byte {
                    Some(frame)
                } else {
                    self.rejected = self.rejected.wrapping_add(1);
                    trace!("frame checksum mismatch, header {=u8:#x}", self.header);
                    None
                }
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Frames dropped for a bad checksum.
    #[must_use]
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    pub fn reset(&mut self) {
        self.state = ParserState::AwaitHeader;
    }
}
