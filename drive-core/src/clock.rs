//! 32-bit microsecond time base built from a 16-bit hardware counter.
//!
//! The counter ticks at 1 MHz and raises an interrupt when it wraps. The
//! interrupt handler calls [`MicrosClock::on_overflow`]; readers combine the
//! overflow count with the live counter value. The result wraps after about
//! 71 minutes, so all comparisons against it must use wrapping arithmetic.

use portable_atomic::{AtomicU32, Ordering};

/// Free-running 16-bit counter at 1 MHz.
pub trait TickCounter {
    fn ticks(&self) -> u16;
}

pub struct MicrosClock<C> {
    counter: C,
    overflows: AtomicU32,
}

impl<C: TickCounter> MicrosClock<C> {
    pub const fn new(counter: C) -> Self {
        Self {
            counter,
            overflows: AtomicU32::new(0),
        }
    }

    /// Counter wrapped. Interrupt context.
    pub fn on_overflow(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Microseconds since the counter started.
    pub fn now_us(&self) -> u32 {
        extend_ticks(&self.overflows, || self.counter.ticks())
    }

    pub fn overflows(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }
}

/// Combine `overflows` with a counter reading, retrying if an overflow was
/// recorded between the two reads.
pub fn extend_ticks(overflows: &AtomicU32, mut read_counter: impl FnMut() -> u16) -> u32 {
    loop {
        let high = overflows.load(Ordering::Acquire);
        let low = read_counter();
        if overflows.load(Ordering::Acquire) == high {
            return (high << 16).wrapping_add(u32::from(low));
        }
    }
}
