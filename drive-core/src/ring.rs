//! Fixed-capacity byte ring buffer.
//!
//! `head` is the next slot to write, `tail` the next slot to read; both wrap
//! with a bitmask, so the capacity must be a power of two. One slot is kept
//! empty to tell "full" from "empty", leaving `N - 1` usable bytes.
//!
//! The buffer itself is not synchronized. [`SerialTransport`] wraps one per
//! direction in a critical-section mutex.
//!
//! [`SerialTransport`]: crate::transport::SerialTransport

use crate::TransportError;

pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> RingBuffer<N> {
    const MASK: usize = {
        assert!(
            N >= 2 && N.is_power_of_two(),
            "ring buffer capacity must be a power of two"
        );
        N - 1
    };

    #[must_use]
    pub const fn new() -> Self {
        let _ = Self::MASK;
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Usable capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        Self::MASK
    }

    /// Number of unread bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail) & Self::MASK
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Number of bytes that can be written without overwriting.
    #[inline]
    #[must_use]
    pub const fn free(&self) -> usize {
        Self::MASK - self.len()
    }

    /// Append one byte, dropping the oldest unread byte when full.
    ///
    /// Returns `true` if a byte was dropped.
    pub fn push_overwrite(&mut self, byte: u8) -> bool {
        self.buf[self.head] = byte;
        self.head = (self.head + 1) & Self::MASK;
        if self.head == self.tail {
            self.tail = (self.tail + 1) & Self::MASK;
            return true;
        }
        false
    }

    /// Append all of `data`, dropping the oldest unread bytes to make room.
    /// If `data` alone exceeds the capacity only its newest bytes are kept.
    ///
    /// Returns the number of bytes dropped, counting both.
    pub fn extend_overwrite(&mut self, data: &[u8]) -> usize {
        let skipped = data.len().saturating_sub(Self::MASK);
        let data = &data[skipped..];
        let overflow = data.len().saturating_sub(self.free());
        self.advance(overflow);
        self.copy_in(data);
        skipped + overflow
    }

    /// Copy up to `dst.len()` unread bytes into `dst` and consume them.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = self.len().min(dst.len());
        if n == 0 {
            return 0;
        }
        self.copy_out(&mut dst[..n]);
        self.advance(n);
        n
    }

    /// Consume one message terminated by `delimiter` (inclusive).
    ///
    /// Returns 0 and consumes nothing if no delimiter is buffered or if the
    /// message would not fit in `dst`.
    pub fn read_until(&mut self, dst: &mut [u8], delimiter: u8) -> usize {
        if dst.is_empty() {
            return 0;
        }
        let mut i = self.tail;
        while i != self.head {
            if self.buf[i] == delimiter {
                let msg_len = (i.wrapping_sub(self.tail) & Self::MASK) + 1;
                if msg_len > dst.len() {
                    return 0;
                }
                self.copy_out(&mut dst[..msg_len]);
                self.advance(msg_len);
                return msg_len;
            }
            i = (i + 1) & Self::MASK;
        }
        0
    }

    /// Write as much of `data` as fits.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if the buffer is full and `data` is not
    /// empty.
    pub fn write_partial(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if data.is_empty() {
            return Ok(0);
        }
        let n = self.free().min(data.len());
        if n == 0 {
            return Err(TransportError::WouldBlock);
        }
        self.copy_in(&data[..n]);
        Ok(n)
    }

    /// Write all of `data` or nothing.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] if `data` does not fit; the buffer is
    /// left untouched.
    pub fn write_all(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if data.len() > self.free() {
            return Err(TransportError::WouldBlock);
        }
        self.copy_in(data);
        Ok(data.len())
    }

    /// Unread bytes from `tail` up to `head` or the physical end of storage,
    /// whichever comes first.
    #[must_use]
    pub fn contiguous(&self) -> &[u8] {
        let end = if self.head >= self.tail { self.head } else { N };
        &self.buf[self.tail..end]
    }

    /// Consume `n` bytes without copying them out.
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.len());
        self.tail = (self.tail + n) & Self::MASK;
    }

    pub fn clear(&mut self) {
        self.tail = self.head;
    }

    // Caller guarantees `dst.len() <= self.len()`.
    fn copy_out(&self, dst: &mut [u8]) {
        let first = dst.len().min(N - self.tail);
        dst[..first].copy_from_slice(&self.buf[self.tail..self.tail + first]);
        let rest = dst.len() - first;
        if rest > 0 {
            dst[first..].copy_from_slice(&self.buf[..rest]);
        }
    }

    // Caller guarantees `data.len() <= self.free()`. Copies in at most two
    // regions and publishes the new head once.
    fn copy_in(&mut self, data: &[u8]) {
        let first = data.len().min(N - self.head);
        self.buf[self.head..self.head + first].copy_from_slice(&data[..first]);
        let rest = data.len() - first;
        if rest > 0 {
            self.buf[..rest].copy_from_slice(&data[first..]);
        }
        self.head = (self.head + data.len()) & Self::MASK;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert_eq!(ring.write_all(b"abc"), Ok(3));
        assert_eq!(ring.len(), 3);

        let mut out = [0u8; 8];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(&out[..3], b"abc");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_extend_overwrite_matches_byte_pushes() {
        let mut bulk: RingBuffer<8> = RingBuffer::new();
        let mut single: RingBuffer<8> = RingBuffer::new();
        bulk.write_all(&[1, 2, 3, 4, 5]).unwrap();
        single.write_all(&[1, 2, 3, 4, 5]).unwrap();

        let data = [6, 7, 8, 9];
        let dropped = data.iter().filter(|&&b| single.push_overwrite(b)).count();
        assert_eq!(bulk.extend_overwrite(&data), dropped);
        assert_eq!(dropped, 2);

        let (mut a, mut b) = ([0u8; 8], [0u8; 8]);
        assert_eq!(bulk.read(&mut a), 7);
        assert_eq!(single.read(&mut b), 7);
        assert_eq!(a, b);
        assert_eq!(&a[..7], &[3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_extend_overwrite_longer_than_capacity() {
        let mut ring: RingBuffer<4> = RingBuffer::new();
        ring.write_all(&[1]).unwrap();
        assert_eq!(ring.extend_overwrite(&[2, 3, 4, 5, 6]), 3);
        let mut out = [0u8; 4];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(&out[..3], &[4, 5, 6]);
    }

    #[test]
    fn test_overwrite_drops_oldest() {
        let mut ring: RingBuffer<4> = RingBuffer::new();
        assert!(!ring.push_overwrite(1));
        assert!(!ring.push_overwrite(2));
        assert!(!ring.push_overwrite(3));
        assert!(ring.push_overwrite(4));
        assert_eq!(ring.len(), 3);

        let mut out = [0u8; 4];
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(&out[..3], &[2, 3, 4]);
    }

    #[test]
    fn test_read_wraps_around_storage_end() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        ring.write_all(&[0; 6]).unwrap();
        ring.advance(6);
        ring.write_all(&[1, 2, 3, 4, 5]).unwrap();

        assert_eq!(ring.contiguous(), &[1, 2]);
        let mut out = [0u8; 5];
        assert_eq!(ring.read(&mut out), 5);
        assert_eq!(out, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_read_until_delimiter() {
        let mut ring: RingBuffer<16> = RingBuffer::new();
        ring.write_all(b"ping\npo").unwrap();

        let mut out = [0u8; 16];
        assert_eq!(ring.read_until(&mut out, b'\n'), 5);
        assert_eq!(&out[..5], b"ping\n");

        // No delimiter left: nothing consumed.
        assert_eq!(ring.read_until(&mut out, b'\n'), 0);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_read_until_too_long_leaves_data() {
        let mut ring: RingBuffer<16> = RingBuffer::new();
        ring.write_all(b"hello\n").unwrap();

        let mut small = [0u8; 4];
        assert_eq!(ring.read_until(&mut small, b'\n'), 0);
        assert_eq!(ring.len(), 6);
    }

    #[test]
    fn test_read_until_across_wrap() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        ring.write_all(&[0; 5]).unwrap();
        ring.advance(5);
        ring.write_all(b"abcd;").unwrap();

        let mut out = [0u8; 8];
        assert_eq!(ring.read_until(&mut out, b';'), 5);
        assert_eq!(&out[..5], b"abcd;");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_write_partial_accepts_prefix() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert_eq!(ring.write_partial(&[9; 5]), Ok(5));
        assert_eq!(ring.write_partial(&[7; 5]), Ok(2));
        assert_eq!(ring.free(), 0);
        assert_eq!(ring.write_partial(&[1]), Err(TransportError::WouldBlock));
        assert_eq!(ring.write_partial(&[]), Ok(0));
    }

    #[test]
    fn test_write_all_rejects_without_side_effects() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        ring.write_all(&[1, 2, 3, 4]).unwrap();
        assert_eq!(ring.write_all(&[5, 6, 7, 8]), Err(TransportError::WouldBlock));
        assert_eq!(ring.len(), 4);

        let mut out = [0u8; 8];
        assert_eq!(ring.read(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_write_all_split_across_end() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        ring.write_all(&[0; 6]).unwrap();
        ring.advance(6);
        assert_eq!(ring.write_all(&[1, 2, 3, 4, 5, 6, 7]), Ok(7));

        let mut out = [0u8; 7];
        assert_eq!(ring.read(&mut out), 7);
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7]);
    }
}
