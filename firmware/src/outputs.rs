//! PWM outputs for the ESC and the steering servo.
//!
//! Both run at 50 Hz from the 125 MHz system clock: divide by 40 for
//! 3.125 MHz, count to 62 499 for a 20 ms period.
//!
//! | Output | GPIO | Slice |
//! |--------|------|-------|
//! | ESC    | 2    | 1 A   |
//! | Servo  | 4    | 2 A   |

use embassy_rp::peripherals::{PIN_2, PIN_4, PWM_SLICE1, PWM_SLICE2};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::Peri;
use fixed::traits::ToFixed;

const DIVIDER: u8 = 40;
const TOP: u16 = 62_499;

/// 50 Hz servo-style PWM, output held low until the first duty is set.
#[must_use]
pub fn servo_pwm_config() -> PwmConfig {
    let mut config = PwmConfig::default();
    config.divider = DIVIDER.to_fixed();
    config.top = TOP;
    config.compare_a = 0;
    config.compare_b = 0;
    config
}

/// ESC output on GPIO 2.
#[must_use]
pub fn esc(slice: Peri<'static, PWM_SLICE1>, pin: Peri<'static, PIN_2>) -> Pwm<'static> {
    Pwm::new_output_a(slice, pin, servo_pwm_config())
}

/// Steering servo output on GPIO 4.
#[must_use]
pub fn steering(slice: Peri<'static, PWM_SLICE2>, pin: Peri<'static, PIN_4>) -> Pwm<'static> {
    Pwm::new_output_a(slice, pin, servo_pwm_config())
}
