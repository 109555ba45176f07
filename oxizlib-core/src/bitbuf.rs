//! Suspendable bit accumulator for the inflate state machines.
//!
//! DEFLATE packs variable-length codes LSB-first within bytes. Unlike a
//! reader that wraps `io::Read` and blocks (or errors) on end of input, the
//! inflate engine must be able to *suspend* mid-symbol when the caller's
//! input slice runs dry and resume later with fresh input. `BitBuf` is
//! therefore a plain value stored inside the inflate state: the accumulator
//! and valid-bit count survive across calls, and refilling is an explicit,
//! fallible step driven by the caller-supplied input slice and cursor.
//!
//! # Suspension contract
//!
//! [`BitBuf::need`] returns `false` when the input slice is exhausted before
//! the requested bits are available. No partial bits are lost: whatever was
//! already buffered stays in the accumulator, and the input cursor has only
//! advanced past bytes that were actually absorbed. Re-invoking with more
//! input resumes exactly.

/// LSB-first bit accumulator with explicit refill.
///
/// Holds up to 64 bits. All inflate decode paths request at most 32 bits at
/// a time, so a refill can always make room for one more byte.
#[derive(Debug, Clone, Default)]
pub struct BitBuf {
    /// Accumulated bits, LSB-first (next bit to consume is bit 0).
    bits: u64,
    /// Number of valid bits in `bits`.
    count: u8,
}

impl BitBuf {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self { bits: 0, count: 0 }
    }

    /// Number of valid bits currently buffered.
    #[inline]
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Pull one byte from `input` at `*pos` into the accumulator.
    ///
    /// Returns `false` if the input is exhausted (suspend).
    #[inline]
    pub fn load_byte(&mut self, input: &[u8], pos: &mut usize) -> bool {
        debug_assert!(self.count <= 56, "accumulator full");
        match input.get(*pos) {
            Some(&byte) => {
                *pos += 1;
                self.bits |= u64::from(byte) << self.count;
                self.count += 8;
                true
            }
            None => false,
        }
    }

    /// Ensure at least `n` bits are buffered, refilling from `input`.
    ///
    /// Returns `false` if the input runs out first (suspend; state intact).
    #[inline]
    pub fn need(&mut self, n: u8, input: &[u8], pos: &mut usize) -> bool {
        debug_assert!(n <= 32, "cannot need more than 32 bits");
        while self.count < n {
            if !self.load_byte(input, pos) {
                return false;
            }
        }
        true
    }

    /// Peek at the low `n` buffered bits without consuming them.
    ///
    /// `n` may exceed `count()`; missing high bits read as zero. This is how
    /// the Huffman decoder indexes a lookup table with a partially filled
    /// accumulator and then checks whether the matched entry actually fits.
    #[inline]
    pub fn peek(&self, n: u8) -> u32 {
        debug_assert!(n <= 32, "cannot peek more than 32 bits");
        (self.bits & ((1u64 << n) - 1)) as u32
    }

    /// Drop the low `n` bits. Never drops more bits than are buffered.
    #[inline]
    pub fn drop_bits(&mut self, n: u8) {
        debug_assert!(n <= self.count, "dropping more bits than buffered");
        self.bits >>= n;
        self.count -= n;
    }

    /// Consume and return the low `n` bits. The bits must be buffered.
    #[inline]
    pub fn take(&mut self, n: u8) -> u32 {
        let v = self.peek(n);
        self.drop_bits(n);
        v
    }

    /// Discard bits up to the next byte boundary.
    pub fn align(&mut self) {
        self.drop_bits(self.count % 8);
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.bits = 0;
        self.count = 0;
    }

    /// Hand whole buffered bytes back to the input cursor.
    ///
    /// At end of block the accumulator may hold bytes that belong to the
    /// container trailer (or the next header). Those bytes came verbatim
    /// from `input`, so rewinding `*pos` and dropping them from the
    /// accumulator restores them losslessly; at most 7 bits remain buffered.
    pub fn rewind_bytes(&mut self, pos: &mut usize) {
        while self.count >= 8 {
            self.count -= 8;
            self.bits &= (1u64 << self.count) - 1;
            *pos -= 1;
        }
    }
}
