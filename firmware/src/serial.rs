//! UART1 plumbing for the serial transport.
//!
//! The transport itself lives in `drive_core`; this module owns the DMA side
//! of it. The receive task keeps one-byte DMA reads running into a staging
//! buffer and reports the write position after each one. The transmit task
//! waits for the transport to hand it a transfer length, copies that run
//! out of the ring, sends it with DMA, then reports completion.
//!
//! Both tasks run on the high-priority interrupt executor, so they preempt
//! the foreground loop the same way a bare DMA interrupt handler would.
//!
//! # Pins
//!
//! - GPIO 8: TX
//! - GPIO 9: RX

use drive_core::{SerialTransport, TxDriver, RX_RING_SIZE, RX_STAGING_SIZE, TX_CHUNK_MAX, TX_RING_SIZE};
use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Link baud rate.
pub const BAUD_RATE: u32 = 115_200;

/// Hands transfer requests from the transport to [`run_tx`].
pub struct SignalTxDriver {
    request: Signal<CriticalSectionRawMutex, usize>,
}

impl SignalTxDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            request: Signal::new(),
        }
    }
}

impl Default for SignalTxDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TxDriver for SignalTxDriver {
    fn start_transfer(&self, len: usize) -> bool {
        self.request.signal(len);
        true
    }
}

/// The transport type shared between the UART tasks and the foreground loop.
pub type Transport =
    SerialTransport<CriticalSectionRawMutex, SignalTxDriver, RX_RING_SIZE, TX_RING_SIZE>;

/// Create the transport. `const` so it can back a `static`.
#[must_use]
pub const fn transport() -> Transport {
    SerialTransport::new(SignalTxDriver::new(), TX_CHUNK_MAX)
}

/// Receive loop. Never returns.
///
/// UART errors (framing, parity, break, overrun) lose the byte in progress;
/// the staging position restarts from zero so later bytes are not mistaken
/// for stale ones.
pub async fn run_rx(mut rx: UartRx<'static, Async>, transport: &'static Transport) -> ! {
    let mut staging = [0u8; RX_STAGING_SIZE];
    let mut pos = 0usize;

    loop {
        match rx.read(&mut staging[pos..=pos]).await {
            Ok(()) => {
                pos += 1;
                transport.on_rx_event(&staging, pos);
                if pos == staging.len() {
                    pos = 0;
                }
            }
            Err(e) => {
                defmt::warn!("uart rx error: {}", uart_error_name(e));
                pos = 0;
                transport.reset_rx_position();
            }
        }
    }
}

/// Transmit loop. Never returns.
pub async fn run_tx(mut tx: UartTx<'static, Async>, transport: &'static Transport) -> ! {
    let mut chunk = [0u8; TX_CHUNK_MAX];

    loop {
        transport.driver().request.wait().await;
        let n = transport.in_flight(&mut chunk);
        if n == 0 {
            continue;
        }
        if let Err(e) = tx.write(&chunk[..n]).await {
            // The bytes are gone either way; carry on with the next run.
            defmt::warn!("uart tx error: {}", uart_error_name(e));
        }
        transport.on_transfer_complete(n);
    }
}

fn uart_error_name(e: UartError) -> &'static str {
    match e {
        UartError::Overrun => "overrun",
        UartError::Break => "break",
        UartError::Parity => "parity",
        UartError::Framing => "framing",
        _ => "other",
    }
}
