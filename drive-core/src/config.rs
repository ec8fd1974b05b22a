//! Compile-time configuration of the vehicle.
//!
//! Every struct has a `DEFAULT` matching the reference vehicle: a 50 Hz ESC
//! and steering servo driven with 1 ms..2 ms pulses, a 68 mm wheel with a
//! hall sensor giving 52 pulses per 10 turns.

/// Receive ring size in bytes.
pub const RX_RING_SIZE: usize = 1024;
/// Transmit ring size in bytes.
pub const TX_RING_SIZE: usize = 1024;
/// Linear buffer the receive DMA writes into.
pub const RX_STAGING_SIZE: usize = 256;
/// Largest single transmit DMA transfer.
pub const TX_CHUNK_MAX: usize = 255;

/// Servo-style pulse timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseRange {
    /// Pulse width at 0 %.
    pub min_us: u32,
    /// Pulse width at 100 %.
    pub max_us: u32,
    /// PWM period.
    pub period_us: u32,
}

impl PulseRange {
    /// 1 ms..2 ms pulses at 50 Hz.
    pub const HOBBY_50HZ: Self = Self {
        min_us: 1000,
        max_us: 2000,
        period_us: 20_000,
    };

    /// Pulse width for `percent`, clamped to `0..=100`.
    #[must_use]
    pub const fn pulse_us(&self, percent: u8) -> u32 {
        let percent = if percent > 100 { 100 } else { percent as u32 };
        self.min_us + (self.max_us - self.min_us) * percent / 100
    }

    /// Convert a pulse width to a duty value out of `max_duty`.
    #[must_use]
    pub const fn duty(&self, pulse_us: u32, max_duty: u16) -> u16 {
        let duty = pulse_us as u64 * max_duty as u64 / self.period_us as u64;
        if duty > max_duty as u64 {
            max_duty
        } else {
            duty as u16
        }
    }
}

/// Scheduler periods and failsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Motor target forced to zero after this long without a command.
    pub failsafe_timeout_ms: u32,
    pub motor_period_us: u32,
    pub speed_period_us: u32,
    pub telemetry_period_us: u32,
}

impl ControllerConfig {
    pub const DEFAULT: Self = Self {
        failsafe_timeout_ms: 500,
        motor_period_us: 1_000,
        speed_period_us: 100_000,
        telemetry_period_us: 10_000,
    };
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Propulsion ESC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorConfig {
    pub pulse: PulseRange,
    /// Speed mapped to 100 % duty, mm/s. Positive.
    pub max_forward_mm_s: i16,
    /// Speed mapped to 0 % duty, mm/s. Negative.
    pub max_reverse_mm_s: i16,
    /// Length of the brake/arming tap.
    pub brake_tap_ms: u32,
    /// Neutral pause after a tap.
    pub neutral_gap_ms: u32,
}

impl MotorConfig {
    pub const DEFAULT: Self = Self {
        pulse: PulseRange::HOBBY_50HZ,
        max_forward_mm_s: 1000,
        max_reverse_mm_s: -500,
        brake_tap_ms: 120,
        neutral_gap_ms: 120,
    };
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Steering servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoConfig {
    pub pulse: PulseRange,
    /// Trim added to every command, percent.
    pub trim_percent: i16,
    /// Commands are clamped to `-max_angle_deg..=max_angle_deg`.
    pub max_angle_deg: i16,
    /// Mechanical travel covered by the full pulse range, degrees.
    pub travel_deg: i16,
}

impl ServoConfig {
    pub const DEFAULT: Self = Self {
        pulse: PulseRange::HOBBY_50HZ,
        trim_percent: 5,
        max_angle_deg: 20,
        travel_deg: 70,
    };
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Wheel speed sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedometerConfig {
    pub wheel_diameter_mm: f32,
    /// Sensor pulses per wheel revolution.
    pub pulses_per_turn: f32,
}

impl SpeedometerConfig {
    pub const DEFAULT: Self = Self {
        wheel_diameter_mm: 68.0,
        // 52 pulses counted over 10 turns.
        pulses_per_turn: 5.2,
    };

    /// Distance covered per wheel revolution, metres.
    #[must_use]
    pub fn perimeter_m(&self) -> f32 {
        self.wheel_diameter_mm * core::f32::consts::PI / 1000.0
    }
}

impl Default for SpeedometerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the controller needs, bundled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveConfig {
    pub controller: ControllerConfig,
    pub motor: MotorConfig,
    pub servo: ServoConfig,
    pub speedometer: SpeedometerConfig,
}

impl DriveConfig {
    pub const DEFAULT: Self = Self {
        controller: ControllerConfig::DEFAULT,
        motor: MotorConfig::DEFAULT,
        servo: ServoConfig::DEFAULT,
        speedometer: SpeedometerConfig::DEFAULT,
    };
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_interpolation() {
        let p = PulseRange::HOBBY_50HZ;
        assert_eq!(p.pulse_us(0), 1000);
        assert_eq!(p.pulse_us(50), 1500);
        assert_eq!(p.pulse_us(100), 2000);
        assert_eq!(p.pulse_us(250), 2000);
    }

    #[test]
    fn test_duty_scaling() {
        let p = PulseRange::HOBBY_50HZ;
        // 62500 counts per 20 ms period.
        assert_eq!(p.duty(1000, 62_500), 3125);
        assert_eq!(p.duty(2000, 62_500), 6250);
        assert_eq!(p.duty(40_000, 100), 100);
    }
}
