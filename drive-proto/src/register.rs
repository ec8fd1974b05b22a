//! Virtual register map exposed over the command link.

/// Highest addressable register (7-bit address space).
pub const MAX_ADDRESS: u8 = 0x7F;

/// Named registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Steering command, signed degrees.
    Steering = 0x00,
    /// Propulsion command, signed mm/s.
    Motor = 0x01,
    /// Reserved for inertial sensor commands. Holds no state.
    Imu = 0x02,
}

impl Register {
    /// Look up the named register at `address`, if any.
    #[must_use]
    pub const fn from_address(address: u8) -> Option<Self> {
        match address & MAX_ADDRESS {
            0x00 => Some(Self::Steering),
            0x01 => Some(Self::Motor),
            0x02 => Some(Self::Imu),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn address(self) -> u8 {
        self as u8
    }
}
