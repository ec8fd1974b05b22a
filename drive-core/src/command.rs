//! Command reader: drains the link through the parser and dispatches
//! validated frames.

use drive_proto::{Access, CommandFrame, MAX_ADDRESS};

use crate::parser::CommandParser;
use crate::registers::{CommandKind, ShadowRegisters};
use crate::transport::Link;

/// Bytes pulled from the link per read call.
pub const READ_CHUNK: usize = 64;

/// Command kinds raised since the indicator was last taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingCommands {
    pub steering: bool,
    pub motor: bool,
    /// Writes to the IMU address or to addresses with no register.
    pub other: bool,
}

impl PendingCommands {
    pub const NONE: Self = Self {
        steering: false,
        motor: false,
        other: false,
    };

    /// Whether any write was accepted.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.steering || self.motor || self.other
    }

    pub fn raise(&mut self, kind: CommandKind) {
        match kind {
            CommandKind::Steering => self.steering = true,
            CommandKind::Motor => self.motor = true,
            CommandKind::Imu | CommandKind::Other => self.other = true,
        }
    }
}

pub struct CommandReader {
    parser: CommandParser,
    registers: ShadowRegisters,
    pending: PendingCommands,
    reply_drops: u32,
}

impl CommandReader {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parser: CommandParser::new(),
            registers: ShadowRegisters::new(),
            pending: PendingCommands::NONE,
            reply_drops: 0,
        }
    }

    /// Parse everything currently buffered on `link`.
    ///
    /// Write frames update the shadow registers and raise the command-ready
    /// indicator. Read frames are answered on `link` immediately.
    pub fn poll<L: Link>(&mut self, link: &L) {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = link.read(&mut buf);
            if n == 0 {
                break;
            }
            for &b in &buf[..n] {
                if let Some(frame) = self.parser.push(b) {
                    self.dispatch(&frame, link);
                }
            }
        }
    }

    /// Apply one validated frame.
    pub fn dispatch<L: Link>(&mut self, frame: &CommandFrame, link: &L) {
        match frame.access() {
            Access::Write => {
                let kind = self.registers.write(frame.address(), frame.value());
                self.pending.raise(kind);
            }
            Access::Read => {
                let base = frame.address();
                for i in 0..frame.burst_count() {
                    let address = base.wrapping_add(i) & MAX_ADDRESS;
                    let value = self.registers.read(address);
                    if link.send_frame(&CommandFrame::write(address, value)).is_err() {
                        self.reply_drops = self.reply_drops.wrapping_add(1);
                        debug!("read reply for {=u8:#x} dropped", address);
                    }
                }
            }
        }
    }

    /// Take the command-ready indicator: every kind written since the last
    /// call, or `None` if no write was accepted.
    pub fn take_commands(&mut self) -> Option<PendingCommands> {
        let pending = core::mem::take(&mut self.pending);
        pending.any().then_some(pending)
    }

    #[must_use]
    pub fn registers(&self) -> &ShadowRegisters {
        &self.registers
    }

    #[must_use]
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Read replies that did not fit in the transmit buffer.
    #[must_use]
    pub fn reply_drops(&self) -> u32 {
        self.reply_drops
    }
}

impl Default for CommandReader {
    fn default() -> Self {
        Self::new()
    }
}
