//! Telemetry frame assembly.

use drive_proto::TelemetryFrame;

use crate::imu::ImuSample;

/// Build the telemetry frame for one tick.
///
/// The speedometer cannot tell direction, so `speed_m_s` is negated when the
/// last accepted motor command was a reverse one.
#[must_use]
pub fn assemble(timestamp_ms: u32, sample: &ImuSample, speed_m_s: f32, motor_command: i16) -> TelemetryFrame {
    let speed = if motor_command < 0 { -speed_m_s } else { speed_m_s };
    TelemetryFrame {
        timestamp_ms,
        accel: sample.accel,
        gyro: sample.gyro,
        speed,
    }
}
