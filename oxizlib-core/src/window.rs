//! Sliding window buffer for inflate.
//!
//! The window is a circular byte buffer of `2^window_bits` (8..=15, so
//! 256 B - 32 KiB) that serves two masters: LZ77 back-references read from
//! it, and the flush path drains it toward the caller's output slice. It
//! tracks a write cursor (where decoded bytes land) and a read cursor (how
//! far the caller has been given output). All wraparound index arithmetic
//! lives behind this type; no other component touches raw indices.
//!
//! # Cursor discipline
//!
//! `read == write` means the window holds no pending output. The write
//! cursor never catches the read cursor from behind: one byte of slack is
//! kept when the read cursor sits mid-buffer, so pending-output bytes are
//! never overwritten before the caller has drained them.

use crate::error::{OxiZlibError, Result};

/// Minimum window bits accepted by inflate.
pub const MIN_WINDOW_BITS: u8 = 8;

/// Maximum window bits accepted by inflate (32 KiB window).
pub const MAX_WINDOW_BITS: u8 = 15;

/// Circular output history buffer with resumable flush.
#[derive(Debug, Clone)]
pub struct Window {
    /// Backing storage, `2^bits` bytes.
    buf: Box<[u8]>,
    /// One past the last valid index (the capacity).
    end: usize,
    /// Flush cursor: next byte to hand to the caller.
    read: usize,
    /// Write cursor: next byte produced lands here.
    write: usize,
    /// Valid history bytes, saturating at capacity. Back-reference
    /// distances are validated against this.
    have: usize,
}

impl Window {
    /// Create a window of `2^bits` bytes. `bits` must be 8..=15.
    pub fn new(bits: u8) -> Result<Self> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
            return Err(OxiZlibError::stream(format!(
                "window bits must be {MIN_WINDOW_BITS}..={MAX_WINDOW_BITS}, got {bits}"
            )));
        }
        let end = 1usize << bits;
        Ok(Self {
            buf: vec![0u8; end].into_boxed_slice(),
            end,
            read: 0,
            write: 0,
            have: 0,
        })
    }

    /// Window capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.end
    }

    /// Reset cursors and history without reallocating.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
        self.have = 0;
    }

    /// Bytes decoded but not yet flushed to the caller.
    pub fn pending(&self) -> usize {
        if self.read <= self.write {
            self.write - self.read
        } else {
            self.end - self.read + self.write
        }
    }

    /// Contiguous free space at the write cursor, after normalizing a
    /// wrapped cursor. Zero means the producer must flush (or suspend).
    pub fn write_avail(&mut self) -> usize {
        if self.write == self.end && self.read != 0 {
            self.write = 0;
        }
        if self.write < self.read {
            // keep one byte of slack so read == write stays unambiguous
            self.read - self.write - 1
        } else {
            self.end - self.write
        }
    }

    /// Append one decoded byte. Caller must have checked `write_avail`.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        debug_assert!(self.write < self.end);
        self.buf[self.write] = byte;
        self.write += 1;
        if self.have < self.end {
            self.have += 1;
        }
    }

    /// Copy raw bytes (a stored block) from `src` into the window.
    ///
    /// Copies at most the contiguous free space; returns the count copied.
    pub fn extend_from_input(&mut self, src: &[u8]) -> usize {
        let n = self.write_avail().min(src.len());
        self.buf[self.write..self.write + n].copy_from_slice(&src[..n]);
        self.write += n;
        self.have = (self.have + n).min(self.end);
        n
    }

    /// Copy `count` bytes of history starting `distance` bytes back.
    ///
    /// Handles source wraparound and overlapping copies (distance < count
    /// produces the repeating-pattern semantics LZ77 requires). Copies at
    /// most the free space available; returns the number copied so a
    /// partial copy can resume after a flush.
    pub fn copy_match(&mut self, distance: usize, count: usize) -> Result<usize> {
        if distance == 0 || distance > self.have {
            return Err(OxiZlibError::distance_too_far_back(distance, self.have));
        }
        let mut remaining = count.min(self.write_avail());
        let copied = remaining;
        let mut src = if self.write >= distance {
            self.write - distance
        } else {
            self.end + self.write - distance
        };
        while remaining > 0 {
            let byte = self.buf[src];
            self.buf[self.write] = byte;
            self.write += 1;
            src += 1;
            if src == self.end {
                src = 0;
            }
            remaining -= 1;
        }
        self.have = (self.have + copied).min(self.end);
        Ok(copied)
    }

    /// Drain pending bytes into `out`, advancing the read cursor.
    ///
    /// Stops early when `out` fills; flushing is resumable. Returns the
    /// number of bytes written to `out`.
    pub fn flush_into(&mut self, out: &mut [u8]) -> usize {
        let mut written = 0;

        // first run: read cursor up to write cursor or buffer end
        let limit = if self.read <= self.write {
            self.write
        } else {
            self.end
        };
        let n = (limit - self.read).min(out.len());
        out[..n].copy_from_slice(&self.buf[self.read..self.read + n]);
        self.read += n;
        written += n;

        // wrapped: continue from the buffer start
        if self.read == self.end {
            self.read = 0;
            if self.write == self.end {
                self.write = 0;
            }
            let n = self.write.min(out.len() - written);
            out[written..written + n].copy_from_slice(&self.buf[..n]);
            self.read += n;
            written += n;
        }

        written
    }

    /// Preload dictionary bytes as initial history.
    ///
    /// Only the last `capacity - 1` bytes are kept (the zlib convention:
    /// the full window can never be addressed before any output exists).
    /// The dictionary is history only; it is not flushed to the caller.
    pub fn preload(&mut self, dictionary: &[u8]) {
        let max = self.end - 1;
        let tail = if dictionary.len() > max {
            &dictionary[dictionary.len() - max..]
        } else {
            dictionary
        };
        self.buf[..tail.len()].copy_from_slice(tail);
        self.read = tail.len();
        self.write = tail.len();
        self.have = tail.len();
    }
}
