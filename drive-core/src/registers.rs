//! Shadow copies of the last accepted register writes.

use drive_proto::Register;

/// What kind of command the last accepted write frame carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Steering,
    Motor,
    Imu,
    /// Write to an address with no register behind it.
    Other,
}

/// Register values as last written by the host.
///
/// Only the command reader writes here; the controller and read replies
/// only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShadowRegisters {
    /// Steering angle in degrees. Stored as received; the servo clamps it.
    pub steering: i16,
    /// Target speed in mm/s.
    pub motor: i16,
}

impl ShadowRegisters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            steering: 0,
            motor: 0,
        }
    }

    /// Value served to read requests. Addresses without state read as 0.
    #[must_use]
    pub fn read(&self, address: u8) -> i16 {
        match Register::from_address(address) {
            Some(Register::Steering) => self.steering,
            Some(Register::Motor) => self.motor,
            Some(Register::Imu) | None => 0,
        }
    }

    /// Store a write and report which command it was.
    pub fn write(&mut self, address: u8, value: i16) -> CommandKind {
        match Register::from_address(address) {
            Some(Register::Steering) => {
                self.steering = value;
                CommandKind::Steering
            }
            Some(Register::Motor) => {
                self.motor = value;
                CommandKind::Motor
            }
            Some(Register::Imu) => CommandKind::Imu,
            None => CommandKind::Other,
        }
    }
}
