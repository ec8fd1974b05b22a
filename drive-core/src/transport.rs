//! Interrupt/DMA-fed serial transport.
//!
//! Two ring buffers, one per direction, each behind a blocking
//! critical-section mutex so that index updates never interleave with the
//! interrupt handlers that share them.
//!
//! The ring storage lives inside the mutex, so a borrow of it cannot outlive
//! the critical section and byte copies happen inside it. Every copy is a
//! block copy of at most two regions, bounded by the staging size on receive
//! and by `chunk_max` on transmit. Nothing loops per byte under the lock.
//!
//! # Receive path
//!
//! The receive DMA fills a linear staging buffer. Each completion or
//! idle-line event reports the DMA write position; [`SerialTransport::on_rx_event`]
//! copies only the bytes that became valid since the previous event, handling
//! a position that wrapped past the end of the staging buffer.
//!
//! # Transmit path
//!
//! Writers append to the TX ring and call [`SerialTransport::kick`]. If no
//! transfer is in flight the transport asks its [`TxDriver`] to send the next
//! contiguous run (capped at the configured chunk size, never wrapping). The
//! driver copies those bytes out with [`SerialTransport::in_flight`] and
//! reports completion with [`SerialTransport::on_transfer_complete`], which
//! consumes them and kicks again until the ring drains.

use core::cell::RefCell;

use drive_proto::CommandFrame;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ring::RingBuffer;
use crate::TransportError;

/// Starts hardware transmissions on behalf of the transport.
///
/// `start_transfer` is called with the transport's TX lock held, so it must
/// not call back into the transport. It should only hand the length over to
/// whatever performs the transfer (a DMA task, an interrupt) and return.
pub trait TxDriver {
    /// Begin sending `len` bytes. Returns `false` if the transfer could not be
    /// started, in which case the transport stays idle.
    fn start_transfer(&self, len: usize) -> bool;
}

/// Byte-level view of a serial link, as used by the command reader and
/// telemetry.
pub trait Link {
    /// Consume up to `dst.len()` received bytes.
    fn read(&self, dst: &mut [u8]) -> usize;

    /// Queue `data` for transmission, all or nothing.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if the transmit buffer lacks space.
    fn write_all(&self, data: &[u8]) -> Result<usize, TransportError>;

    /// Queue one encoded command frame.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if the transmit buffer lacks space.
    fn send_frame(&self, frame: &CommandFrame) -> Result<(), TransportError> {
        self.write_all(&frame.encode()).map(|_| ())
    }
}

struct RxState<const N: usize> {
    ring: RingBuffer<N>,
    staging_pos: usize,
    overruns: u32,
}

struct TxState<const N: usize> {
    ring: RingBuffer<N>,
    busy: bool,
    in_flight: usize,
}

pub struct SerialTransport<M: RawMutex, D: TxDriver, const RX: usize, const TX: usize> {
    rx: Mutex<M, RefCell<RxState<RX>>>,
    tx: Mutex<M, RefCell<TxState<TX>>>,
    driver: D,
    chunk_max: usize,
}

impl<M: RawMutex, D: TxDriver, const RX: usize, const TX: usize> SerialTransport<M, D, RX, TX> {
    /// Create a transport whose transfers are at most `chunk_max` bytes.
    pub const fn new(driver: D, chunk_max: usize) -> Self {
        Self {
            rx: Mutex::new(RefCell::new(RxState {
                ring: RingBuffer::new(),
                staging_pos: 0,
                overruns: 0,
            })),
            tx: Mutex::new(RefCell::new(TxState {
                ring: RingBuffer::new(),
                busy: false,
                in_flight: 0,
            })),
            driver,
            chunk_max,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    // ---- receive ----

    /// Store one received byte, overwriting the oldest unread byte on
    /// overflow. Interrupt context.
    pub fn push_byte(&self, byte: u8) {
        self.rx.lock(|rx| {
            let mut rx = rx.borrow_mut();
            if rx.ring.push_overwrite(byte) {
                rx.overruns = rx.overruns.wrapping_add(1);
            }
        });
    }

    /// Ingest the bytes the receive DMA wrote into `staging` since the last
    /// event. `pos` is the DMA write position, `0..=staging.len()`.
    ///
    /// The new span goes into the ring as at most two block copies, each
    /// bounded by the staging length.
    pub fn on_rx_event(&self, staging: &[u8], pos: usize) {
        let len = staging.len();
        if len == 0 {
            return;
        }
        let pos = pos.min(len);
        self.rx.lock(|rx| {
            let mut rx = rx.borrow_mut();
            let old = rx.staging_pos;
            if pos == old {
                return;
            }
            let dropped = if pos > old {
                rx.ring.extend_overwrite(&staging[old..pos])
            } else {
                let tail = rx.ring.extend_overwrite(&staging[old..]);
                tail + rx.ring.extend_overwrite(&staging[..pos])
            };
            rx.overruns = rx.overruns.wrapping_add(dropped as u32);
            rx.staging_pos = if pos == len { 0 } else { pos };
        });
    }

    /// Forget the staging position, for when the receive DMA is restarted
    /// from the beginning of its buffer.
    pub fn reset_rx_position(&self) {
        self.rx.lock(|rx| rx.borrow_mut().staging_pos = 0);
    }

    /// Number of received, unread bytes.
    pub fn available(&self) -> usize {
        self.rx.lock(|rx| rx.borrow().ring.len())
    }

    /// Bytes dropped because the receive ring was full.
    pub fn rx_overruns(&self) -> u32 {
        self.rx.lock(|rx| rx.borrow().overruns)
    }

    /// Consume up to `dst.len()` received bytes. Never blocks.
    pub fn read(&self, dst: &mut [u8]) -> usize {
        self.rx.lock(|rx| rx.borrow_mut().ring.read(dst))
    }

    /// Consume one `delimiter`-terminated message (inclusive).
    ///
    /// Returns 0 without consuming anything if no complete message is
    /// buffered or it would not fit in `dst`.
    pub fn read_until(&self, dst: &mut [u8], delimiter: u8) -> usize {
        self.rx
            .lock(|rx| rx.borrow_mut().ring.read_until(dst, delimiter))
    }

    // ---- transmit ----

    /// Queue as much of `data` as fits and start transmitting.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if no byte could be queued.
    pub fn write_partial(&self, data: &[u8]) -> Result<usize, TransportError> {
        let written = self
            .tx
            .lock(|tx| tx.borrow_mut().ring.write_partial(data))?;
        self.kick();
        Ok(written)
    }

    /// Queue all of `data` or nothing, then start transmitting.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if `data` does not fit; nothing is
    /// queued.
    pub fn write_all(&self, data: &[u8]) -> Result<usize, TransportError> {
        let written = self.tx.lock(|tx| tx.borrow_mut().ring.write_all(data));
        match written {
            Ok(n) => {
                self.kick();
                Ok(n)
            }
            Err(e) => {
                debug!("tx full, rejected {} bytes", data.len());
                Err(e)
            }
        }
    }

    /// All-or-nothing write with the result reduced to success/failure.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if `data` does not fit.
    pub fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        self.write_all(data).map(|_| ())
    }

    /// Send a write frame carrying `value` for register `address`.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if the frame does not fit.
    pub fn send_write16(&self, address: u8, value: i16) -> Result<(), TransportError> {
        self.write(&CommandFrame::write(address, value).encode())
    }

    /// Send a read request for `count` registers starting at `address`.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if the frame does not fit.
    pub fn send_read_burst(&self, address: u8, count: u8, flags: u8) -> Result<(), TransportError> {
        self.write(&CommandFrame::read_burst(address, count, flags).encode())
    }

    /// Start a transfer if data is queued and none is in flight.
    pub fn kick(&self) {
        self.tx.lock(|tx| {
            let mut tx = tx.borrow_mut();
            if tx.busy || tx.ring.is_empty() {
                return;
            }
            let chunk = tx.ring.contiguous().len().min(self.chunk_max);
            if chunk == 0 {
                return;
            }
            tx.busy = true;
            tx.in_flight = chunk;
            if !self.driver.start_transfer(chunk) {
                tx.busy = false;
                tx.in_flight = 0;
            }
        });
    }

    /// Copy the bytes of the transfer in flight into `dst`. Returns the number
    /// copied, 0 if idle. One block copy of at most `chunk_max` bytes.
    pub fn in_flight(&self, dst: &mut [u8]) -> usize {
        self.tx.lock(|tx| {
            let tx = tx.borrow();
            if !tx.busy {
                return 0;
            }
            let src = &tx.ring.contiguous()[..tx.in_flight];
            let n = src.len().min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
            n
        })
    }

    /// Report that `sent` bytes of the in-flight transfer went out. Consumes
    /// them and starts the next transfer, if any.
    pub fn on_transfer_complete(&self, sent: usize) {
        self.tx.lock(|tx| {
            let mut tx = tx.borrow_mut();
            let sent = sent.min(tx.in_flight);
            tx.ring.advance(sent);
            tx.busy = false;
            tx.in_flight = 0;
        });
        self.kick();
    }

    /// Whether a transfer is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.tx.lock(|tx| tx.borrow().busy)
    }

    /// Bytes queued for transmission, including any in flight.
    pub fn pending(&self) -> usize {
        self.tx.lock(|tx| tx.borrow().ring.len())
    }

    /// Free space in the transmit ring.
    pub fn tx_free(&self) -> usize {
        self.tx.lock(|tx| tx.borrow().ring.free())
    }
}

impl<M: RawMutex, D: TxDriver, const RX: usize, const TX: usize> Link
    for SerialTransport<M, D, RX, TX>
{
    fn read(&self, dst: &mut [u8]) -> usize {
        SerialTransport::read(self, dst)
    }

    fn write_all(&self, data: &[u8]) -> Result<usize, TransportError> {
        SerialTransport::write_all(self, data)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::vec::Vec;

    /// Records every transfer request; completion is driven by the test.
    #[derive(Default)]
    pub(crate) struct RecordingDriver {
        pub starts: RefCell<Vec<usize>>,
        pub refuse: Cell<bool>,
    }

    impl TxDriver for RecordingDriver {
        fn start_transfer(&self, len: usize) -> bool {
            if self.refuse.get() {
                return false;
            }
            self.starts.borrow_mut().push(len);
            true
        }
    }

    type TestTransport<const TX: usize> =
        SerialTransport<CriticalSectionRawMutex, RecordingDriver, 16, TX>;

    fn transport<const TX: usize>(chunk_max: usize) -> TestTransport<TX> {
        SerialTransport::new(RecordingDriver::default(), chunk_max)
    }

    /// Drive the transmitter to completion, returning everything sent.
    fn drain<const TX: usize>(t: &TestTransport<TX>) -> Vec<u8> {
        let mut sent = Vec::new();
        let mut chunk = [0u8; 64];
        while t.is_busy() {
            let n = t.in_flight(&mut chunk);
            sent.extend_from_slice(&chunk[..n]);
            t.on_transfer_complete(n);
        }
        sent
    }

    #[test]
    fn test_push_byte_and_read() {
        let t = transport::<16>(8);
        for b in b"hello" {
            t.push_byte(*b);
        }
        assert_eq!(t.available(), 5);

        let mut out = [0u8; 3];
        assert_eq!(t.read(&mut out), 3);
        assert_eq!(&out, b"hel");
        assert_eq!(t.available(), 2);
    }

    #[test]
    fn test_rx_overflow_counts_dropped_bytes() {
        let t = transport::<16>(8);
        for b in 0..20u8 {
            t.push_byte(b);
        }
        assert_eq!(t.available(), 15);
        assert_eq!(t.rx_overruns(), 5);

        let mut out = [0u8; 15];
        t.read(&mut out);
        assert_eq!(out[0], 5);
        assert_eq!(out[14], 19);
    }

    #[test]
    fn test_rx_event_copies_only_new_span() {
        let t = transport::<16>(8);
        let staging = *b"abcdefgh";

        t.on_rx_event(&staging, 3);
        t.on_rx_event(&staging, 3);
        t.on_rx_event(&staging, 5);

        let mut out = [0u8; 8];
        assert_eq!(t.read(&mut out), 5);
        assert_eq!(&out[..5], b"abcde");
    }

    #[test]
    fn test_rx_event_overflow_across_wrap_keeps_newest() {
        let t = transport::<16>(8);
        let mut staging = [0u8; 16];
        for (i, b) in staging.iter_mut().enumerate() {
            *b = i as u8;
        }

        t.on_rx_event(&staging, 12);
        // Tail 12..16 then head 0..6 on top of 12 unread bytes.
        t.on_rx_event(&staging, 6);
        assert_eq!(t.rx_overruns(), 7);

        let mut out = [0u8; 16];
        assert_eq!(t.read(&mut out), 15);
        assert_eq!(&out[..15], &[7, 8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rx_event_wrapped_position() {
        let t = transport::<16>(8);
        let staging = *b"abcdefgh";

        t.on_rx_event(&staging, 6);
        let mut out = [0u8; 8];
        t.read(&mut out);

        // DMA went past the end and continued at the start.
        t.on_rx_event(&staging, 2);
        assert_eq!(t.read(&mut out), 4);
        assert_eq!(&out[..4], b"ghab");
    }

    #[test]
    fn test_rx_event_full_buffer_resets_position() {
        let t = transport::<16>(8);
        let staging = *b"abcdefgh";

        t.on_rx_event(&staging, 8);
        t.on_rx_event(&staging, 1);

        let mut out = [0u8; 16];
        assert_eq!(t.read(&mut out), 9);
        assert_eq!(&out[..9], b"abcdefgha");
    }

    #[test]
    fn test_read_until_through_transport() {
        let t = transport::<16>(8);
        for b in b"ok\nrest" {
            t.push_byte(*b);
        }
        let mut out = [0u8; 8];
        assert_eq!(t.read_until(&mut out, b'\n'), 3);
        assert_eq!(&out[..3], b"ok\n");
        assert_eq!(t.available(), 4);
    }

    #[test]
    fn test_write_kicks_single_transfer() {
        let t = transport::<16>(8);
        t.write_all(b"abc").unwrap();
        t.write_all(b"de").unwrap();

        // Second write finds a transfer in flight and does not restart it.
        assert_eq!(&*t.driver().starts.borrow(), &[3]);
        assert_eq!(drain(&t), b"abcde");
        assert_eq!(&*t.driver().starts.borrow(), &[3, 2]);
        assert_eq!(t.pending(), 0);
    }

    #[test]
    fn test_transfers_respect_chunk_max() {
        let t = transport::<32>(4);
        t.write_all(b"0123456789").unwrap();
        assert_eq!(drain(&t), b"0123456789");
        assert_eq!(&*t.driver().starts.borrow(), &[4, 4, 2]);
    }

    #[test]
    fn test_transfers_never_wrap() {
        let t = transport::<8>(255);
        t.write_all(&[0; 6]).unwrap();
        drain(&t);
        t.driver().starts.borrow_mut().clear();

        t.write_all(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(drain(&t), &[1, 2, 3, 4, 5]);
        assert_eq!(&*t.driver().starts.borrow(), &[2, 3]);
    }

    #[test]
    fn test_write_all_rejects_when_full() {
        let t = transport::<8>(255);
        t.write_all(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(t.write_all(&[6, 7, 8]), Err(TransportError::WouldBlock));
        assert_eq!(t.pending(), 5);
        assert_eq!(drain(&t), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_write_partial_reports_prefix_then_would_block() {
        let t = transport::<8>(255);
        assert_eq!(t.write_partial(&[1; 5]), Ok(5));
        assert_eq!(t.write_partial(&[2; 5]), Ok(2));
        assert_eq!(t.write_partial(&[3]), Err(TransportError::WouldBlock));
    }

    #[test]
    fn test_refused_transfer_leaves_transport_idle() {
        let t = transport::<16>(8);
        t.driver().refuse.set(true);
        t.write_all(b"abc").unwrap();
        assert!(!t.is_busy());
        assert_eq!(t.pending(), 3);

        t.driver().refuse.set(false);
        t.kick();
        assert_eq!(drain(&t), b"abc");
    }

    #[test]
    fn test_send_helpers_encode_frames() {
        let t = transport::<16>(8);
        t.send_write16(0x01, 500).unwrap();
        t.send_read_burst(0x01, 3, 0).unwrap();
        assert_eq!(drain(&t), &[0x01, 0xF4, 0x01, 0x2C, 0x81, 0x03, 0x00, 0x5F]);
    }
}
