//! Microsecond time base on PWM slice 4.
//!
//! The slice free-runs at 1 MHz (125 MHz / 125) over its full 16-bit range
//! and raises `PWM_IRQ_WRAP` on every wrap. The interrupt handler in the
//! binary calls [`on_wrap_interrupt`], which feeds [`CLOCK`].

use drive_core::{MicrosClock, TickCounter};
use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_rp::pac;
use embassy_rp::peripherals::PWM_SLICE4;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::Peri;
use fixed::traits::ToFixed;

const SLICE: usize = 4;
const SLICE_BIT: u32 = 1 << SLICE;

/// Reads the slice 4 counter register.
pub struct SliceCounter;

impl TickCounter for SliceCounter {
    fn ticks(&self) -> u16 {
        pac::PWM.ch(SLICE).ctr().read().ctr()
    }
}

/// System-wide microsecond clock.
pub static CLOCK: MicrosClock<SliceCounter> = MicrosClock::new(SliceCounter);

/// Start the counter and unmask its wrap interrupt.
///
/// The returned handle keeps the slice configured; dropping it stops the
/// clock.
#[must_use]
pub fn start(slice: Peri<'static, PWM_SLICE4>) -> Pwm<'static> {
    let mut config = PwmConfig::default();
    config.divider = 125u8.to_fixed();
    config.top = u16::MAX;
    let pwm = Pwm::new_free(slice, config);

    pac::PWM.intr().write(|w| w.0 = SLICE_BIT);
    pac::PWM.inte().modify(|w| w.0 |= SLICE_BIT);
    interrupt::PWM_IRQ_WRAP.set_priority(Priority::P1);
    // SAFETY: the handler only touches the clock's atomic counter.
    unsafe { interrupt::PWM_IRQ_WRAP.enable() };
    pwm
}

/// Body of the `PWM_IRQ_WRAP` handler.
pub fn on_wrap_interrupt() {
    if pac::PWM.ints().read().0 & SLICE_BIT != 0 {
        pac::PWM.intr().write(|w| w.0 = SLICE_BIT);
        CLOCK.on_overflow();
    }
}

/// Milliseconds since boot, wrapping after about 49 days.
#[must_use]
pub fn now_ms() -> u32 {
    embassy_time::Instant::now().as_millis() as u32
}
