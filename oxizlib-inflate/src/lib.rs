//! # OxiZlib Inflate
//!
//! Streaming DEFLATE decompression (RFC 1951) with zlib (RFC 1950) and
//! gzip (RFC 1952) container support, in pure Rust.
//!
//! The engine is fully suspendable: it decodes from caller-supplied
//! input slices into caller-supplied output slices and can stop and
//! resume at any bit position, so it works with one byte of buffer space
//! on either side. No `io::Read`/`io::Write` plumbing is required (or
//! provided) at this layer.
//!
//! ## One-shot decompression
//!
//! ```rust
//! use oxizlib_inflate::zlib_decompress;
//!
//! // zlib stream holding "Hello" as a stored block
//! let data = [
//!     0x78, 0x9C, 0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l',
//!     b'o', 0x05, 0x8C, 0x01, 0xF5,
//! ];
//! assert_eq!(zlib_decompress(&data).unwrap(), b"Hello");
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use oxizlib_core::traits::FlushMode;
//! use oxizlib_inflate::{InflateStatus, Inflater};
//!
//! let data = [
//!     0x78, 0x9C, 0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l',
//!     b'o', 0x05, 0x8C, 0x01, 0xF5,
//! ];
//! let mut inflater = Inflater::new().unwrap();
//! let mut out = Vec::new();
//! let mut buf = [0u8; 4]; // deliberately tiny
//! let mut pos = 0;
//! loop {
//!     let step = inflater
//!         .inflate(&data[pos..], &mut buf, FlushMode::None)
//!         .unwrap();
//!     pos += step.consumed;
//!     out.extend_from_slice(&buf[..step.produced]);
//!     if step.status == InflateStatus::StreamEnd {
//!         break;
//!     }
//! }
//! assert_eq!(out, b"Hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod blocks;
mod codes;
mod gzip;
pub mod huffman;
pub mod inflate;
pub mod tables;

pub use inflate::{InflateConfig, InflateStatus, Inflater, Inflation, Wrapper};
pub use oxizlib_core::error::{OxiZlibError, Result};
pub use oxizlib_core::traits::{DecompressStatus, Decompressor, FlushMode};

/// Decompress a complete in-memory stream with the given configuration.
fn decompress_all(config: InflateConfig, data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Inflater::with_config(config)?;
    let mut out = Vec::new();
    let mut buf = [0u8; 32768];
    let mut pos = 0;
    loop {
        let step = inflater.inflate(&data[pos..], &mut buf, FlushMode::Finish)?;
        pos += step.consumed;
        out.extend_from_slice(&buf[..step.produced]);
        match step.status {
            InflateStatus::StreamEnd => return Ok(out),
            InflateStatus::NeedDict => {
                return Err(OxiZlibError::stream(
                    "stream requires a preset dictionary",
                ));
            }
            InflateStatus::BufError => {
                return Err(OxiZlibError::stream("unexpected end of stream"));
            }
            InflateStatus::Ok => {}
        }
    }
}

/// Decompress a raw DEFLATE stream (no container).
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    decompress_all(
        InflateConfig {
            wrapper: Wrapper::Raw,
            ..InflateConfig::default()
        },
        data,
    )
}

/// Decompress a zlib stream, verifying its Adler-32 trailer.
pub fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_all(InflateConfig::default(), data)
}

/// Decompress a gzip member, verifying its CRC-32 and length trailer.
pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_all(
        InflateConfig {
            wrapper: Wrapper::Gzip,
            ..InflateConfig::default()
        },
        data,
    )
}
