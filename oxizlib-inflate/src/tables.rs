//! Fixed DEFLATE tables (RFC 1951 section 3.2.5).
//!
//! Length codes 257..=285 and distance codes 0..=29 each map to a base
//! value plus a count of extra bits read verbatim from the stream. The
//! code-length alphabet of dynamic blocks is transmitted in a fixed
//! scrambled order chosen so the symbols most likely to be absent come
//! last and can be omitted.

/// Base match lengths for literal/length codes 257..=285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for literal/length codes 257..=285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base match distances for distance codes 0..=29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes 0..=29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Transmission order of the code-length alphabet in a dynamic block
/// header.
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Number of literal/length symbols (literals 0..=255, end-of-block 256,
/// lengths 257..=285, plus two reserved).
pub const LITLEN_SYMBOLS: usize = 288;

/// Number of distance symbols (0..=29 plus two reserved).
pub const DISTANCE_SYMBOLS: usize = 32;

/// Number of code-length symbols.
pub const CODE_LENGTH_SYMBOLS: usize = 19;

/// Longest DEFLATE code, in bits.
pub const MAX_CODE_BITS: u8 = 15;

/// Maximum match length a single length code can produce.
pub const MAX_MATCH: usize = 258;
