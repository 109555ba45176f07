//! Core traits for streaming decompression.
//!
//! The [`Decompressor`] trait is the seam between codec engines and the
//! callers that drive them chunk by chunk. An engine consumes from a
//! caller-supplied input slice, produces into a caller-supplied output
//! slice, and reports how far it got - it never blocks on I/O.

use crate::error::Result;

/// Status of a streaming decompression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// More input is needed to continue decompression.
    NeedsInput,
    /// More output buffer space is needed.
    NeedsOutput,
    /// A preset dictionary is required before decoding can proceed.
    NeedsDictionary,
    /// Decompression is complete (final block decoded, trailer verified).
    Done,
}

/// Flush mode for a decompression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// No special handling - decode as much as the buffers allow.
    #[default]
    None,
    /// Emit all pending output before returning.
    Sync,
    /// The caller asserts the remaining input completes the stream.
    Finish,
}

/// A streaming decompressor (decoder).
///
/// Implemented by decompression engines that can process data in bounded
/// chunks, suspending when either buffer is exhausted.
pub trait Decompressor {
    /// Decompress data from input to output.
    ///
    /// # Arguments
    ///
    /// * `input` - Input compressed data
    /// * `output` - Output buffer for decompressed data
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)>;

    /// Reset the decompressor to its initial state.
    fn reset(&mut self);

    /// Check if the decompressor has finished.
    fn is_finished(&self) -> bool;

    /// Decompress all data at once (convenience method).
    fn decompress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; 32768];

        loop {
            let (consumed, produced, status) = self.decompress(&input[input_pos..], &mut buffer)?;

            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            match status {
                DecompressStatus::Done => break,
                DecompressStatus::NeedsInput if input_pos >= input.len() => break,
                DecompressStatus::NeedsOutput | DecompressStatus::NeedsInput => continue,
                DecompressStatus::NeedsDictionary => break,
            }
        }

        Ok(output)
    }
}
