//! Wheel speed from a free-running pulse counter.

use crate::config::SpeedometerConfig;

/// A 16-bit hardware counter incremented by the wheel sensor.
pub trait PulseCounter {
    /// Current counter value. Wraps at `u16::MAX`.
    fn count(&mut self) -> u16;
}

pub struct Speedometer<C> {
    counter: C,
    config: SpeedometerConfig,
    last_count: u16,
    last_ms: u32,
    speed_m_s: f32,
}

impl<C: PulseCounter> Speedometer<C> {
    /// Start measuring from the counter's current value.
    pub fn new(mut counter: C, config: SpeedometerConfig, now_ms: u32) -> Self {
        let last_count = counter.count();
        Self {
            counter,
            config,
            last_count,
            last_ms: now_ms,
            speed_m_s: 0.0,
        }
    }

    /// Compute the average speed since the previous call, in m/s.
    ///
    /// Returns the previous value if no time has elapsed. The result is
    /// unsigned; direction comes from the motor command.
    pub fn update(&mut self, now_ms: u32) -> f32 {
        let elapsed_ms = now_ms.wrapping_sub(self.last_ms);
        if elapsed_ms == 0 {
            return self.speed_m_s;
        }
        let count = self.counter.count();
        let pulses = count.wrapping_sub(self.last_count);

        let turns = f32::from(pulses) / self.config.pulses_per_turn;
        let distance_m = turns * self.config.perimeter_m();
        self.speed_m_s = distance_m / (elapsed_ms as f32 / 1000.0);

        self.last_count = count;
        self.last_ms = now_ms;
        self.speed_m_s
    }

    /// Last computed speed, m/s.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed_m_s
    }

    pub fn counter_mut(&mut self) -> &mut C {
        &mut self.counter
    }
}
