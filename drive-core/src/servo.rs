//! Steering servo output.

use embedded_hal::pwm::SetDutyCycle;

use crate::config::ServoConfig;

pub struct SteeringServo<P> {
    pwm: P,
    config: ServoConfig,
    percent: u8,
}

impl<P: SetDutyCycle> SteeringServo<P> {
    /// Take ownership of the servo output and center it.
    pub fn new(pwm: P, config: ServoConfig) -> Self {
        let mut servo = Self {
            pwm,
            config,
            percent: 0,
        };
        servo.set_angle_degrees(0);
        servo
    }

    /// Steer to `angle` degrees, clamped to the configured mechanical limit.
    pub fn set_angle_degrees(&mut self, angle: i16) {
        let limit = self.config.max_angle_deg;
        let angle = i32::from(angle.clamp(-limit, limit));
        let travel = i32::from(self.config.travel_deg);
        let percent = (angle + travel / 2) * 100 / travel;
        self.apply(percent);
    }

    /// Drive the servo by raw position percentage. Trim still applies.
    pub fn set_percent(&mut self, percent: u8) {
        self.apply(i32::from(percent));
    }

    /// Trimmed percentage last written.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }

    #[must_use]
    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    fn apply(&mut self, percent: i32) {
        let corrected = (percent + i32::from(self.config.trim_percent)).clamp(0, 100) as u8;
        self.percent = corrected;
        let pulse_us = self.config.pulse.pulse_us(corrected);
        let duty = self.config.pulse.duty(pulse_us, self.pwm.max_duty_cycle());
        if self.pwm.set_duty_cycle(duty).is_err() {
            warn!("servo pwm write failed");
        }
    }
}
