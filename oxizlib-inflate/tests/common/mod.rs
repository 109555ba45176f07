#![allow(dead_code)]

//! Hand-rolled stream builders for the decoder tests.
//!
//! There is no compressor in this workspace, so the tests synthesize
//! DEFLATE streams directly: stored blocks, and fixed-table blocks
//! encoded with the RFC 1951 section 3.2.6 code assignments.

use oxizlib_core::checksum::{Adler32, Crc32};
use oxizlib_inflate::tables::{
    DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS,
};

/// LSB-first bit packer matching the DEFLATE bit order.
#[derive(Default)]
pub struct BitSink {
    bytes: Vec<u8>,
    acc: u32,
    count: u8,
}

impl BitSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `width` bits, least significant first.
    pub fn put(&mut self, value: u32, width: u8) {
        self.acc |= value << self.count;
        self.count += width;
        while self.count >= 8 {
            self.bytes.push((self.acc & 0xFF) as u8);
            self.acc >>= 8;
            self.count -= 8;
        }
    }

    /// Append a Huffman code, which travels most significant bit first.
    pub fn put_code(&mut self, code: u32, width: u8) {
        for bit in (0..width).rev() {
            self.put((code >> bit) & 1, 1);
        }
    }

    /// Pad to a byte boundary with zero bits.
    pub fn align(&mut self) {
        if self.count > 0 {
            self.put(0, 8 - self.count);
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.bytes
    }
}

/// One piece of a fixed-table block.
pub enum Token<'a> {
    Literals(&'a [u8]),
    Match { length: usize, distance: usize },
}

fn put_fixed_literal(sink: &mut BitSink, byte: u8) {
    match byte {
        0..=143 => sink.put_code(0x30 + u32::from(byte), 8),
        _ => sink.put_code(0x190 + u32::from(byte) - 144, 9),
    }
}

fn put_length(sink: &mut BitSink, length: usize) {
    let idx = LENGTH_BASE
        .iter()
        .rposition(|&base| usize::from(base) <= length)
        .expect("length in 3..=258");
    // guard against lengths that fall past the code's range
    assert!(length - usize::from(LENGTH_BASE[idx]) < 1 << LENGTH_EXTRA_BITS[idx]);
    let symbol = 257 + idx;
    match symbol {
        257..=279 => sink.put_code(symbol as u32 - 256, 7),
        _ => sink.put_code(0xC0 + symbol as u32 - 280, 8),
    }
    sink.put(
        (length - usize::from(LENGTH_BASE[idx])) as u32,
        LENGTH_EXTRA_BITS[idx],
    );
}

fn put_distance(sink: &mut BitSink, distance: usize) {
    let idx = DISTANCE_BASE
        .iter()
        .rposition(|&base| usize::from(base) <= distance)
        .expect("distance in 1..=32768");
    sink.put_code(idx as u32, 5);
    sink.put(
        (distance - usize::from(DISTANCE_BASE[idx])) as u32,
        DISTANCE_EXTRA_BITS[idx],
    );
}

/// Append a fixed-table block holding `tokens`.
pub fn fixed_block(sink: &mut BitSink, last: bool, tokens: &[Token<'_>]) {
    sink.put(u32::from(last), 1);
    sink.put(1, 2);
    for token in tokens {
        match *token {
            Token::Literals(bytes) => {
                for &b in bytes {
                    put_fixed_literal(sink, b);
                }
            }
            Token::Match { length, distance } => {
                put_length(sink, length);
                put_distance(sink, distance);
            }
        }
    }
    sink.put_code(0, 7); // end of block
}

/// Append a stored block holding `data`.
pub fn stored_block(sink: &mut BitSink, last: bool, data: &[u8]) {
    sink.put(u32::from(last), 1);
    sink.put(0, 2);
    sink.align();
    let len = data.len() as u16;
    sink.put(u32::from(len), 16);
    sink.put(u32::from(!len), 16);
    for &b in data {
        sink.put(u32::from(b), 8);
    }
}

/// Raw DEFLATE stream: `data` as a single final fixed block.
pub fn raw_fixed(data: &[u8]) -> Vec<u8> {
    let mut sink = BitSink::new();
    fixed_block(&mut sink, true, &[Token::Literals(data)]);
    sink.finish()
}

/// Raw DEFLATE stream: `data` as a single final stored block.
pub fn raw_stored(data: &[u8]) -> Vec<u8> {
    let mut sink = BitSink::new();
    stored_block(&mut sink, true, data);
    sink.finish()
}

/// Wrap a raw DEFLATE body in a zlib container (no dictionary).
pub fn zlib_wrap(body: &[u8], plain: &[u8]) -> Vec<u8> {
    let mut out = vec![0x78, 0x9C];
    out.extend_from_slice(body);
    out.extend_from_slice(&Adler32::checksum(plain).to_be_bytes());
    out
}

/// zlib stream of `data` in a stored block.
pub fn zlib_stored(data: &[u8]) -> Vec<u8> {
    zlib_wrap(&raw_stored(data), data)
}

/// zlib stream of `data` in a fixed block.
pub fn zlib_fixed(data: &[u8]) -> Vec<u8> {
    zlib_wrap(&raw_fixed(data), data)
}

/// Wrap a raw DEFLATE body in a minimal gzip member.
pub fn gzip_wrap(body: &[u8], plain: &[u8]) -> Vec<u8> {
    let mut out = vec![0x1F, 0x8B, 8, 0, 0, 0, 0, 0, 0, 0xFF];
    out.extend_from_slice(body);
    out.extend_from_slice(&Crc32::checksum(plain).to_le_bytes());
    out.extend_from_slice(&(plain.len() as u32).to_le_bytes());
    out
}
