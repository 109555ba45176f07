//! Error types for OxiZlib operations.
//!
//! This module provides the error type shared by the inflate engine and its
//! container layers. The taxonomy distinguishes protocol/format errors (the
//! stream is damaged and no retry will help short of `sync`) from caller
//! misuse (`Stream` variants). Flow-control conditions - need more input,
//! need more output space, need a preset dictionary - are *not* errors; they
//! are reported as statuses by the session API.

use thiserror::Error;

/// The main error type for OxiZlib operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OxiZlibError {
    /// Compression method nibble in the zlib/gzip header is not DEFLATE.
    #[error("unknown compression method: {method:#04x}")]
    UnsupportedMethod {
        /// The method value found in the header.
        method: u8,
    },

    /// Stream declares a window larger than the negotiated maximum.
    #[error("invalid window size: stream needs {declared} bits, configured maximum is {max}")]
    WindowTooLarge {
        /// Window bits declared by the stream header.
        declared: u8,
        /// Configured maximum window bits.
        max: u8,
    },

    /// zlib header failed the mod-31 check.
    #[error("incorrect header check")]
    HeaderCheckMismatch,

    /// Invalid magic number in a gzip header.
    #[error("invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual bytes found.
        found: Vec<u8>,
    },

    /// gzip header has reserved flag bits set.
    #[error("unknown gzip header flags set: {flags:#04x}")]
    InvalidHeaderFlags {
        /// The FLG byte found in the header.
        flags: u8,
    },

    /// Reserved DEFLATE block type (3).
    #[error("invalid block type")]
    InvalidBlockType,

    /// Stored block LEN and one's-complement NLEN disagree.
    #[error("invalid stored block lengths: len {len:#06x}, nlen {nlen:#06x}")]
    StoredLengthMismatch {
        /// LEN field.
        len: u16,
        /// NLEN field.
        nlen: u16,
    },

    /// Dynamic block header declares more symbols than the alphabets allow.
    #[error("too many length or distance symbols")]
    TooManySymbols,

    /// A code-length set is over-subscribed, incomplete, or its run-length
    /// encoding is malformed.
    #[error("invalid code lengths: {message}")]
    InvalidCodeLengths {
        /// Description of the defect.
        message: String,
    },

    /// A decoded literal/length symbol has no meaning in the alphabet.
    #[error("invalid literal/length code")]
    InvalidLiteralLengthCode,

    /// A decoded distance symbol has no meaning in the alphabet.
    #[error("invalid distance code")]
    InvalidDistanceCode,

    /// Back-reference reaches before the start of valid window history.
    #[error("invalid distance too far back: {distance} exceeds {available} bytes of history")]
    DistanceTooFarBack {
        /// The offending distance.
        distance: usize,
        /// Valid history bytes at that point.
        available: usize,
    },

    /// Trailer checksum does not match the checksum of the produced output.
    #[error("incorrect data check: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the stream trailer.
        expected: u32,
        /// Checksum computed over the output.
        computed: u32,
    },

    /// gzip ISIZE trailer does not match the produced output length.
    #[error("incorrect length check: expected {expected} bytes, produced {actual}")]
    SizeMismatch {
        /// Length stored in the trailer (mod 2^32).
        expected: u32,
        /// Produced length (mod 2^32).
        actual: u32,
    },

    /// Supplied preset dictionary does not match the stream's DICTID.
    #[error("incorrect dictionary: expected adler {expected:#010x}, computed {computed:#010x}")]
    Dictionary {
        /// Adler-32 transmitted in the stream header.
        expected: u32,
        /// Adler-32 of the supplied dictionary.
        computed: u32,
    },

    /// Inconsistent use of the API (wrong state, invalid parameters).
    #[error("stream error: {message}")]
    Stream {
        /// Description of the misuse.
        message: String,
    },
}

/// Result type alias for OxiZlib operations.
pub type Result<T> = std::result::Result<T, OxiZlibError>;

impl OxiZlibError {
    /// Create an unsupported method error.
    pub fn unsupported_method(method: u8) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Create a window-too-large error.
    pub fn window_too_large(declared: u8, max: u8) -> Self {
        Self::WindowTooLarge { declared, max }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a stored block length mismatch error.
    pub fn stored_length_mismatch(len: u16, nlen: u16) -> Self {
        Self::StoredLengthMismatch { len, nlen }
    }

    /// Create an invalid code lengths error.
    pub fn invalid_code_lengths(message: impl Into<String>) -> Self {
        Self::InvalidCodeLengths {
            message: message.into(),
        }
    }

    /// Create a distance-too-far-back error.
    pub fn distance_too_far_back(distance: usize, available: usize) -> Self {
        Self::DistanceTooFarBack {
            distance,
            available,
        }
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u32, computed: u32) -> Self {
        Self::ChecksumMismatch { expected, computed }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(expected: u32, actual: u32) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create a dictionary mismatch error.
    pub fn dictionary(expected: u32, computed: u32) -> Self {
        Self::Dictionary { expected, computed }
    }

    /// Create a stream (caller misuse) error.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// True for protocol/format errors: the compressed stream itself is
    /// damaged. After one of these the session makes no further progress
    /// until an explicit `sync`.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, Self::Stream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiZlibError::unsupported_method(0x07);
        assert!(err.to_string().contains("unknown compression method"));

        let err = OxiZlibError::checksum_mismatch(0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("incorrect data check"));

        let err = OxiZlibError::invalid_code_lengths("over-subscribed code set");
        assert!(err.to_string().contains("invalid code lengths"));
        assert!(err.to_string().contains("over-subscribed"));
    }

    #[test]
    fn test_data_error_classification() {
        assert!(OxiZlibError::InvalidBlockType.is_data_error());
        assert!(OxiZlibError::HeaderCheckMismatch.is_data_error());
        assert!(OxiZlibError::distance_too_far_back(10, 5).is_data_error());
        assert!(!OxiZlibError::stream("inflate after end").is_data_error());
    }
}
