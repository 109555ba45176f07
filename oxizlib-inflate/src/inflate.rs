//! Streaming inflate sessions.
//!
//! [`Inflater`] wraps the block decoder with container handling: zlib
//! (RFC 1950) and gzip (RFC 1952) headers and trailers, preset
//! dictionaries, and checksum verification. The session is driven
//! entirely by caller-supplied slices; any call may consume and produce
//! zero or more bytes and suspend at an arbitrary bit position, to be
//! resumed with fresh buffers.
//!
//! Flow control is reported through [`InflateStatus`]; damaged streams
//! surface as errors, which stick: once a data error is reported, every
//! further call returns the same error until [`Inflater::sync`] finds a
//! resync marker or [`Inflater::reset`] starts over.

use crate::blocks::{BlockStatus, InflateBlocks};
use crate::gzip::{GZIP_MAGIC, GzipHeaderSkipper};
use oxizlib_core::bitbuf::BitBuf;
use oxizlib_core::checksum::{Adler32, Crc32};
use oxizlib_core::error::{OxiZlibError, Result};
use oxizlib_core::traits::{DecompressStatus, Decompressor, FlushMode};
use oxizlib_core::window::MAX_WINDOW_BITS;

/// Container format a session expects around the DEFLATE data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrapper {
    /// zlib wrapper: 2-byte header, Adler-32 trailer.
    #[default]
    Zlib,
    /// gzip wrapper: member header, CRC-32 and length trailer.
    Gzip,
    /// Raw DEFLATE, no header or trailer.
    Raw,
    /// Detect zlib or gzip from the first bytes.
    Auto,
}

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateConfig {
    /// Window size as a power of two, 8..=15.
    pub window_bits: u8,
    /// Expected container format.
    pub wrapper: Wrapper,
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            window_bits: MAX_WINDOW_BITS,
            wrapper: Wrapper::Zlib,
        }
    }
}

impl InflateConfig {
    /// Interpret a zlib-style `windowBits` argument: 8..=15 selects the
    /// zlib wrapper, negative values raw DEFLATE, +16 gzip, +32
    /// zlib/gzip auto-detection.
    pub fn from_zlib_bits(bits: i32) -> Result<Self> {
        let (wrapper, window_bits) = match bits {
            -15..=-8 => (Wrapper::Raw, -bits),
            8..=15 => (Wrapper::Zlib, bits),
            24..=31 => (Wrapper::Gzip, bits - 16),
            40..=47 => (Wrapper::Auto, bits - 32),
            _ => {
                return Err(OxiZlibError::stream(format!(
                    "unsupported windowBits value: {bits}"
                )));
            }
        };
        Ok(Self {
            window_bits: window_bits as u8,
            wrapper,
        })
    }
}

/// Outcome of one [`Inflater::inflate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateStatus {
    /// Progress was made; call again with more input or output space.
    Ok,
    /// The stream is complete and its trailer verified.
    StreamEnd,
    /// A preset dictionary is required; call [`Inflater::set_dictionary`].
    NeedDict,
    /// No progress was possible with the given buffers.
    BufError,
}

/// Byte counts and status for one inflate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inflation {
    /// Bytes consumed from the input slice.
    pub consumed: usize,
    /// Bytes written to the output slice.
    pub produced: usize,
    /// Session status after the step.
    pub status: InflateStatus,
}

/// The output checksum mandated by the container.
#[derive(Debug, Clone)]
enum Check {
    /// Raw streams carry no trailer.
    Raw,
    Adler(Adler32),
    Crc(Crc32),
}

impl Check {
    fn update(&mut self, data: &[u8]) {
        match self {
            Check::Raw => {}
            Check::Adler(a) => a.update(data),
            Check::Crc(c) => c.update(data),
        }
    }

    fn value(&self) -> u32 {
        match self {
            Check::Raw => 0,
            Check::Adler(a) => a.finish(),
            Check::Crc(c) => c.finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Read and validate the container header (or detect gzip).
    Header,
    /// Delegate to the gzip header parser.
    GzipHeader,
    /// Read the 4-byte dictionary id of an FDICT stream.
    DictId,
    /// Wait for the caller to supply the dictionary.
    Dict,
    /// Decode DEFLATE blocks.
    Blocks,
    /// Verify the checksum trailer.
    Check,
    /// Verify the gzip ISIZE trailer.
    GzipLen,
    /// Stream complete.
    Done,
}

#[derive(Debug, Clone)]
struct InflateState {
    config: InflateConfig,
    mode: Mode,
    bits: BitBuf,
    blocks: InflateBlocks,
    gzip: GzipHeaderSkipper,
    check: Check,
    /// Adler-32 of the required dictionary, from the DICTID field.
    dict_id: u32,
    total_in: u64,
    total_out: u64,
    /// Sticky data error, replayed on every call until sync or reset.
    error: Option<OxiZlibError>,
    /// Resync-marker bytes matched so far by `sync`.
    sync_have: u8,
}

impl InflateState {
    fn new(config: InflateConfig) -> Result<Self> {
        let (mode, check) = Self::initial(config.wrapper);
        Ok(Self {
            config,
            mode,
            bits: BitBuf::new(),
            blocks: InflateBlocks::new(config.window_bits)?,
            gzip: GzipHeaderSkipper::new(),
            check,
            dict_id: 0,
            total_in: 0,
            total_out: 0,
            error: None,
            sync_have: 0,
        })
    }

    fn initial(wrapper: Wrapper) -> (Mode, Check) {
        match wrapper {
            Wrapper::Raw => (Mode::Blocks, Check::Raw),
            // the concrete checksum is chosen once the header is seen
            _ => (Mode::Header, Check::Adler(Adler32::new())),
        }
    }

    /// Move pending window output into the caller's slice, folding the
    /// flushed bytes into the container checksum.
    fn drain(&mut self, output: &mut [u8], out_pos: &mut usize) {
        let n = self.blocks.flush(&mut output[*out_pos..]);
        self.check.update(&output[*out_pos..*out_pos + n]);
        self.total_out += n as u64;
        *out_pos += n;
    }

    fn process(
        &mut self,
        input: &[u8],
        pos: &mut usize,
        output: &mut [u8],
        out_pos: &mut usize,
    ) -> Result<InflateStatus> {
        loop {
            match self.mode {
                Mode::Header => {
                    if !self.bits.need(16, input, pos) {
                        return Ok(InflateStatus::Ok);
                    }
                    let b0 = self.bits.peek(8) as u8;
                    let b1 = (self.bits.peek(16) >> 8) as u8;
                    let gzip_allowed =
                        matches!(self.config.wrapper, Wrapper::Gzip | Wrapper::Auto);
                    if gzip_allowed && [b0, b1] == GZIP_MAGIC {
                        // leave the magic buffered; the header parser
                        // consumes and validates it
                        self.check = Check::Crc(Crc32::new());
                        self.gzip = GzipHeaderSkipper::new();
                        self.mode = Mode::GzipHeader;
                    } else if self.config.wrapper == Wrapper::Gzip {
                        return Err(OxiZlibError::invalid_magic(GZIP_MAGIC, [b0, b1]));
                    } else {
                        if (u16::from(b0) << 8 | u16::from(b1)) % 31 != 0 {
                            return Err(OxiZlibError::HeaderCheckMismatch);
                        }
                        if b0 & 0x0F != 8 {
                            return Err(OxiZlibError::unsupported_method(b0 & 0x0F));
                        }
                        let declared = (b0 >> 4) + 8;
                        if declared > self.config.window_bits {
                            return Err(OxiZlibError::window_too_large(
                                declared,
                                self.config.window_bits,
                            ));
                        }
                        self.bits.drop_bits(16);
                        self.check = Check::Adler(Adler32::new());
                        self.mode = if b1 & 0x20 != 0 {
                            Mode::DictId
                        } else {
                            Mode::Blocks
                        };
                    }
                }

                Mode::GzipHeader => {
                    if !self.gzip.run(&mut self.bits, input, pos)? {
                        return Ok(InflateStatus::Ok);
                    }
                    self.mode = Mode::Blocks;
                }

                Mode::DictId => {
                    if !self.bits.need(32, input, pos) {
                        return Ok(InflateStatus::Ok);
                    }
                    // DICTID is transmitted big-endian
                    self.dict_id = self.bits.take(32).swap_bytes();
                    self.mode = Mode::Dict;
                }

                Mode::Dict => return Ok(InflateStatus::NeedDict),

                Mode::Blocks => {
                    // make room first so a full window can always drain
                    self.drain(output, out_pos);
                    let status = self.blocks.run(&mut self.bits, input, pos)?;
                    self.drain(output, out_pos);
                    match status {
                        BlockStatus::NeedInput => return Ok(InflateStatus::Ok),
                        BlockStatus::NeedOutput => {
                            if *out_pos == output.len() {
                                return Ok(InflateStatus::Ok);
                            }
                        }
                        BlockStatus::StreamEnd => {
                            self.mode = match &self.check {
                                Check::Raw => Mode::Done,
                                _ => Mode::Check,
                            };
                        }
                    }
                }

                Mode::Check => {
                    // every produced byte must reach the caller before
                    // the verdict
                    self.drain(output, out_pos);
                    if self.blocks.pending() > 0 {
                        return Ok(InflateStatus::Ok);
                    }
                    // discard the padding bits of the final partial byte
                    self.bits.align();
                    if !self.bits.need(32, input, pos) {
                        return Ok(InflateStatus::Ok);
                    }
                    let raw = self.bits.take(32);
                    let computed = self.check.value();
                    match &self.check {
                        Check::Adler(_) => {
                            let stored = raw.swap_bytes();
                            if stored != computed {
                                return Err(OxiZlibError::checksum_mismatch(stored, computed));
                            }
                            self.mode = Mode::Done;
                        }
                        Check::Crc(_) => {
                            // gzip trailer is little-endian
                            if raw != computed {
                                return Err(OxiZlibError::checksum_mismatch(raw, computed));
                            }
                            self.mode = Mode::GzipLen;
                        }
                        Check::Raw => unreachable!("raw streams skip the trailer"),
                    }
                }

                Mode::GzipLen => {
                    if !self.bits.need(32, input, pos) {
                        return Ok(InflateStatus::Ok);
                    }
                    let stored = self.bits.take(32);
                    let actual = self.total_out as u32;
                    if stored != actual {
                        return Err(OxiZlibError::size_mismatch(stored, actual));
                    }
                    self.mode = Mode::Done;
                }

                Mode::Done => {
                    // raw streams have no trailer step, so decoded bytes
                    // may still sit in the window when the final block
                    // completes
                    self.drain(output, out_pos);
                    if self.blocks.pending() > 0 {
                        return Ok(InflateStatus::Ok);
                    }
                    return Ok(InflateStatus::StreamEnd);
                }
            }
        }
    }
}

/// A suspendable decompression session.
///
/// ```rust
/// use oxizlib_inflate::{Inflater, InflateStatus};
/// use oxizlib_core::traits::FlushMode;
///
/// // zlib stream holding the empty string
/// let data = [0x78, 0x9C, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01];
/// let mut inflater = Inflater::new().unwrap();
/// let mut out = [0u8; 16];
/// let step = inflater.inflate(&data, &mut out, FlushMode::Finish).unwrap();
/// assert_eq!(step.status, InflateStatus::StreamEnd);
/// assert_eq!(step.produced, 0);
/// ```
#[derive(Debug, Clone)]
pub struct Inflater {
    /// `None` once the session has been ended.
    state: Option<InflateState>,
}

impl Inflater {
    /// Create a session expecting a zlib stream with a 32 KiB window.
    pub fn new() -> Result<Self> {
        Self::with_config(InflateConfig::default())
    }

    /// Create a session with an explicit wrapper and window size.
    pub fn with_config(config: InflateConfig) -> Result<Self> {
        Ok(Self {
            state: Some(InflateState::new(config)?),
        })
    }

    fn state_mut(&mut self) -> Result<&mut InflateState> {
        self.state
            .as_mut()
            .ok_or_else(|| OxiZlibError::stream("session already ended"))
    }

    /// Decompress from `input` into `output`, suspending when either
    /// slice runs out.
    ///
    /// Returns the consumed/produced counts and a status. A call that
    /// can make no progress at all reports [`InflateStatus::BufError`]
    /// without changing any state; data errors are returned as `Err` and
    /// replayed on subsequent calls until [`sync`](Self::sync) or
    /// [`reset`](Self::reset).
    ///
    /// Bytes flushed to `output` before an error was detected are valid
    /// decoded data. An errored call reports no counts, but the flushed
    /// bytes are included in [`total_out`](Self::total_out), so the
    /// delta across the failing call gives their number.
    pub fn inflate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<Inflation> {
        // Sync and Finish need no special handling: every call already
        // drains the window as far as the output slice allows.
        let _ = flush;

        let state = self.state_mut()?;
        if let Some(err) = &state.error {
            return Err(err.clone());
        }

        let mut pos = 0;
        let mut out_pos = 0;
        let result = state.process(input, &mut pos, output, &mut out_pos);
        state.total_in += pos as u64;

        match result {
            Ok(status) => {
                let status = if status == InflateStatus::Ok && pos == 0 && out_pos == 0 {
                    InflateStatus::BufError
                } else {
                    status
                };
                Ok(Inflation {
                    consumed: pos,
                    produced: out_pos,
                    status,
                })
            }
            Err(err) => {
                if err.is_data_error() {
                    state.error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    /// Supply the preset dictionary a [`InflateStatus::NeedDict`] stream
    /// asked for.
    ///
    /// For zlib streams the dictionary's Adler-32 must match the DICTID
    /// field. Raw sessions accept a dictionary at any time before
    /// decoding output.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        let state = self.state_mut()?;
        match state.mode {
            Mode::Dict => {
                let computed = Adler32::checksum(dictionary);
                if computed != state.dict_id {
                    return Err(OxiZlibError::dictionary(state.dict_id, computed));
                }
                state.blocks.preload_dictionary(dictionary);
                state.mode = Mode::Blocks;
                Ok(())
            }
            _ if state.config.wrapper == Wrapper::Raw => {
                state.blocks.preload_dictionary(dictionary);
                Ok(())
            }
            _ => Err(OxiZlibError::stream(
                "set_dictionary called without a pending dictionary request",
            )),
        }
    }

    /// Scan `input` for a resync marker (the empty stored block a sync
    /// flush emits: `00 00 FF FF`) and restart block decoding past it.
    ///
    /// Returns the bytes consumed and whether the marker completed. The
    /// match may span calls; partial progress is kept. On success the
    /// sticky error is cleared. Output produced after a resync is not
    /// covered by the stream checksum.
    pub fn sync(&mut self, input: &[u8]) -> Result<(usize, bool)> {
        let state = self.state_mut()?;

        let mut got = state.sync_have;
        let mut next = 0;
        while next < input.len() && got < 4 {
            let byte = input[next];
            if byte == (if got < 2 { 0x00 } else { 0xFF }) {
                got += 1;
            } else if byte != 0 {
                got = 0;
            } else {
                got = 4 - got;
            }
            next += 1;
        }
        state.sync_have = got;
        state.total_in += next as u64;

        if got < 4 {
            return Ok((next, false));
        }
        state.sync_have = 0;
        state.bits.clear();
        state.blocks.resync();
        state.error = None;
        state.mode = Mode::Blocks;
        Ok((next, true))
    }

    /// True when decoding sits exactly at a sync-flush block boundary.
    pub fn sync_point(&self) -> bool {
        self.state.as_ref().is_some_and(|s| {
            s.mode == Mode::Blocks && s.blocks.sync_point() && s.bits.count() == 0
        })
    }

    /// Reset to the start of a new stream, keeping buffers allocated.
    pub fn reset(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        let (mode, check) = InflateState::initial(state.config.wrapper);
        state.mode = mode;
        state.check = check;
        state.bits.clear();
        state.blocks.reset();
        state.gzip = GzipHeaderSkipper::new();
        state.dict_id = 0;
        state.total_in = 0;
        state.total_out = 0;
        state.error = None;
        state.sync_have = 0;
        Ok(())
    }

    /// Release the session. Further calls return a stream error.
    pub fn end(&mut self) -> Result<()> {
        match self.state.take() {
            Some(_) => Ok(()),
            None => Err(OxiZlibError::stream("session already ended")),
        }
    }

    /// Total compressed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.total_in)
    }

    /// Total decompressed bytes produced.
    pub fn total_out(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.total_out)
    }

    /// The running output checksum, or the required dictionary id while
    /// a dictionary is pending.
    pub fn adler(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| match s.mode {
            Mode::DictId | Mode::Dict => s.dict_id,
            _ => s.check.value(),
        })
    }

    /// Message of the sticky error, if any.
    pub fn msg(&self) -> Option<String> {
        self.state
            .as_ref()
            .and_then(|s| s.error.as_ref().map(|e| e.to_string()))
    }
}

impl Decompressor for Inflater {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)> {
        let step = self.inflate(input, output, FlushMode::None)?;
        let status = match step.status {
            InflateStatus::StreamEnd => DecompressStatus::Done,
            InflateStatus::NeedDict => DecompressStatus::NeedsDictionary,
            InflateStatus::Ok | InflateStatus::BufError => {
                if step.produced == output.len() && !output.is_empty() {
                    DecompressStatus::NeedsOutput
                } else {
                    DecompressStatus::NeedsInput
                }
            }
        };
        Ok((step.consumed, step.produced, status))
    }

    fn reset(&mut self) {
        let _ = Inflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.state
            .as_ref()
            .is_none_or(|s| s.mode == Mode::Done && s.blocks.pending() == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // zlib stream of the empty string: header 78 9C, final empty stored
    // block, Adler-32(“”) = 1
    const EMPTY_ZLIB: [u8; 11] = [
        0x78, 0x9C, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x01,
    ];

    // zlib stream of "Hello" as a stored block; Adler-32 = 0x058C01F5
    const HELLO_ZLIB: [u8; 16] = [
        0x78, 0x9C, 0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o', 0x05, 0x8C, 0x01,
        0xF5,
    ];

    #[test]
    fn test_from_zlib_bits() {
        assert_eq!(
            InflateConfig::from_zlib_bits(15).unwrap(),
            InflateConfig {
                window_bits: 15,
                wrapper: Wrapper::Zlib
            }
        );
        assert_eq!(
            InflateConfig::from_zlib_bits(-9).unwrap(),
            InflateConfig {
                window_bits: 9,
                wrapper: Wrapper::Raw
            }
        );
        assert_eq!(
            InflateConfig::from_zlib_bits(31).unwrap(),
            InflateConfig {
                window_bits: 15,
                wrapper: Wrapper::Gzip
            }
        );
        assert_eq!(
            InflateConfig::from_zlib_bits(47).unwrap(),
            InflateConfig {
                window_bits: 15,
                wrapper: Wrapper::Auto
            }
        );
        assert!(InflateConfig::from_zlib_bits(16).is_err());
        assert!(InflateConfig::from_zlib_bits(0).is_err());
    }

    #[test]
    fn test_empty_zlib_stream() {
        let mut inf = Inflater::new().unwrap();
        let mut out = [0u8; 8];
        let step = inf.inflate(&EMPTY_ZLIB, &mut out, FlushMode::Finish).unwrap();
        assert_eq!(step.status, InflateStatus::StreamEnd);
        assert_eq!(step.produced, 0);
        assert_eq!(step.consumed, EMPTY_ZLIB.len());
        assert_eq!(inf.adler(), 1);
    }

    #[test]
    fn test_hello_stored_zlib() {
        let mut inf = Inflater::new().unwrap();
        let mut out = [0u8; 16];
        let step = inf.inflate(&HELLO_ZLIB, &mut out, FlushMode::Finish).unwrap();
        assert_eq!(step.status, InflateStatus::StreamEnd);
        assert_eq!(&out[..step.produced], b"Hello");
        assert_eq!(inf.adler(), 0x058C01F5);
        assert_eq!(inf.total_in(), HELLO_ZLIB.len() as u64);
        assert_eq!(inf.total_out(), 5);
    }

    #[test]
    fn test_no_progress_reports_buf_error() {
        let mut inf = Inflater::new().unwrap();
        let mut out = [0u8; 8];
        let step = inf.inflate(&[], &mut out, FlushMode::None).unwrap();
        assert_eq!(step.status, InflateStatus::BufError);
        assert_eq!(step.consumed, 0);
        assert_eq!(step.produced, 0);

        // the failed call changed nothing; the stream still decodes
        let step = inf.inflate(&HELLO_ZLIB, &mut out, FlushMode::Finish).unwrap();
        assert_eq!(step.status, InflateStatus::StreamEnd);
        assert_eq!(&out[..step.produced], b"Hello");
    }

    #[test]
    fn test_corrupt_trailer_is_sticky() {
        let mut data = HELLO_ZLIB;
        let last = data.len() - 1;
        data[last] ^= 0xFF;

        let mut inf = Inflater::new().unwrap();
        let mut out = [0u8; 16];
        let err = inf.inflate(&data, &mut out, FlushMode::Finish).unwrap_err();
        assert!(matches!(err, OxiZlibError::ChecksumMismatch { .. }));
        // produced bytes are counted in the totals even though the call
        // errored
        assert_eq!(inf.total_out(), 5);
        assert_eq!(&out[..5], b"Hello");

        // replayed verbatim
        let err2 = inf.inflate(&[], &mut out, FlushMode::None).unwrap_err();
        assert_eq!(err, err2);
        assert!(inf.msg().unwrap().contains("incorrect data check"));
    }

    #[test]
    fn test_end_is_final() {
        let mut inf = Inflater::new().unwrap();
        inf.end().unwrap();
        assert!(inf.end().is_err());
        let mut out = [0u8; 1];
        assert!(inf.inflate(&[], &mut out, FlushMode::None).is_err());
    }

    #[test]
    fn test_reset_reuses_session() {
        let mut inf = Inflater::new().unwrap();
        let mut out = [0u8; 16];
        inf.inflate(&HELLO_ZLIB, &mut out, FlushMode::Finish).unwrap();
        inf.reset().unwrap();
        assert_eq!(inf.total_in(), 0);
        let step = inf.inflate(&HELLO_ZLIB, &mut out, FlushMode::Finish).unwrap();
        assert_eq!(step.status, InflateStatus::StreamEnd);
        assert_eq!(&out[..step.produced], b"Hello");
    }

    #[test]
    fn test_bad_zlib_header_check() {
        let mut inf = Inflater::new().unwrap();
        let mut out = [0u8; 8];
        let err = inf
            .inflate(&[0x78, 0x9D], &mut out, FlushMode::None)
            .unwrap_err();
        assert!(matches!(err, OxiZlibError::HeaderCheckMismatch));
    }

    #[test]
    fn test_window_larger_than_configured() {
        let config = InflateConfig {
            window_bits: 10,
            wrapper: Wrapper::Zlib,
        };
        let mut inf = Inflater::with_config(config).unwrap();
        let mut out = [0u8; 8];
        // CMF 0x78 declares a 32 KiB window; 0x78 0x9C passes mod 31
        let err = inf
            .inflate(&[0x78, 0x9C], &mut out, FlushMode::None)
            .unwrap_err();
        assert!(matches!(
            err,
            OxiZlibError::WindowTooLarge {
                declared: 15,
                max: 10
            }
        ));
    }
}
