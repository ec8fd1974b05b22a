//! Wheel pulse counter.
//!
//! The hall sensor drives the B input of PWM slice 3 (GPIO 7), which counts
//! rising edges in hardware.

use drive_core::PulseCounter;
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::{PIN_7, PWM_SLICE3};
use embassy_rp::pwm::{Config as PwmConfig, InputMode, Pwm};
use embassy_rp::Peri;

pub struct WheelCounter {
    pwm: Pwm<'static>,
}

impl WheelCounter {
    #[must_use]
    pub fn new(slice: Peri<'static, PWM_SLICE3>, pin: Peri<'static, PIN_7>) -> Self {
        let mut config = PwmConfig::default();
        config.top = u16::MAX;
        Self {
            pwm: Pwm::new_input(slice, pin, Pull::Up, InputMode::RisingEdge, config),
        }
    }
}

impl PulseCounter for WheelCounter {
    fn count(&mut self) -> u16 {
        self.pwm.counter()
    }
}
