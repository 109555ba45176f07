//! # OxiZlib Core
//!
//! Core components for the OxiZlib streaming decompression library.
//!
//! This crate provides the fundamental building blocks for the inflate
//! engine:
//!
//! - [`bitbuf`]: suspendable LSB-first bit accumulator
//! - [`window`]: circular sliding-window buffer with resumable flush
//! - [`checksum`]: Adler-32 and CRC-32 rolling checksums
//! - [`traits`]: streaming decompressor seam
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! OxiZlib is a layered stack; this crate is the bottom layer:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Session API                                         │
//! │     Inflater, one-shot helpers                          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Container                                           │
//! │     zlib / gzip header and trailer handling             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Codec                                               │
//! │     block parser, Huffman decoder, symbol engine        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L0: Primitives (this crate)                             │
//! │     BitBuf, Window, Adler-32/CRC-32                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxizlib_core::bitbuf::BitBuf;
//! use oxizlib_core::checksum::Adler32;
//!
//! let input = [0xAB, 0xCD];
//! let mut pos = 0;
//! let mut bits = BitBuf::new();
//! assert!(bits.need(12, &input, &mut pos));
//! assert_eq!(bits.take(12), 0xDAB);
//!
//! assert_eq!(Adler32::checksum(b""), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitbuf;
pub mod checksum;
pub mod error;
pub mod traits;
pub mod window;

// Re-exports for convenience
pub use bitbuf::BitBuf;
pub use checksum::{Adler32, Crc32};
pub use error::{OxiZlibError, Result};
pub use traits::{DecompressStatus, Decompressor, FlushMode};
pub use window::{MAX_WINDOW_BITS, MIN_WINDOW_BITS, Window};
