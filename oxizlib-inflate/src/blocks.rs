//! DEFLATE block sequencing.
//!
//! [`InflateBlocks`] walks the block structure of a raw DEFLATE stream:
//! the 3-bit block header, stored blocks, fixed-table blocks, and dynamic
//! blocks with their transmitted code-length preamble. Symbol decoding
//! inside a compressed block is delegated to [`InflateCodes`]; this layer
//! owns the sliding window and the per-block header state.
//!
//! Like every layer of the engine, block parsing is resumable: each mode
//! re-checks its input requirements on entry, so a call that suspends
//! mid-header picks up exactly where it stopped.

use crate::codes::{BlockTables, InflateCodes, Step};
use crate::huffman::{Alphabet, HuffmanTable, Op};
use crate::tables::{CODE_LENGTH_ORDER, CODE_LENGTH_SYMBOLS};
use oxizlib_core::bitbuf::BitBuf;
use oxizlib_core::error::{OxiZlibError, Result};
use oxizlib_core::window::Window;

/// Why a block-parsing step stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockStatus {
    /// Input slice exhausted.
    NeedInput,
    /// Window full of pending output; flush before continuing.
    NeedOutput,
    /// Final block fully decoded (pending output may remain).
    StreamEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Read the 3-bit block header.
    Type,
    /// Read LEN/NLEN of a stored block.
    Lens,
    /// Copy stored-block bytes.
    Stored,
    /// Read HLIT/HDIST/HCLEN of a dynamic block.
    Table,
    /// Read the 3-bit code-length code lengths.
    BitLens,
    /// Decode the literal/length and distance code lengths.
    CodeLens,
    /// Decode symbols through [`InflateCodes`].
    Codes,
    /// Final block decoded; report end once.
    Dry,
    /// Stream complete.
    Done,
    /// A data error was reported; no further progress.
    Bad,
}

/// Resumable raw-DEFLATE block decoder that owns the sliding window.
#[derive(Debug, Clone)]
pub(crate) struct InflateBlocks {
    mode: Mode,
    /// BFINAL seen on the current block header.
    last: bool,
    window: Window,
    /// Stored-block bytes left to copy.
    stored_len: usize,
    /// Literal/length codes declared by the dynamic header.
    nlen: usize,
    /// Distance codes declared by the dynamic header.
    ndist: usize,
    /// Code-length codes declared by the dynamic header.
    ncode: usize,
    /// Progress cursor within the current header phase.
    index: usize,
    /// Code lengths of the code-length alphabet, in symbol order.
    clen_lens: [u8; CODE_LENGTH_SYMBOLS],
    clen_table: HuffmanTable,
    /// Literal/length then distance code lengths, as decoded.
    lens: Vec<u8>,
    codes: InflateCodes,
}

impl InflateBlocks {
    /// Create a block decoder with a `2^window_bits` byte window.
    pub(crate) fn new(window_bits: u8) -> Result<Self> {
        Ok(Self {
            mode: Mode::Type,
            last: false,
            window: Window::new(window_bits)?,
            stored_len: 0,
            nlen: 0,
            ndist: 0,
            ncode: 0,
            index: 0,
            clen_lens: [0; CODE_LENGTH_SYMBOLS],
            // placeholder; replaced when a dynamic header is parsed
            clen_table: HuffmanTable::build(Alphabet::Distance, &[0; 30])?,
            lens: vec![0; 320],
            codes: InflateCodes::new(BlockTables::Fixed),
        })
    }

    /// Reset to the start of a stream, keeping the window allocation.
    pub(crate) fn reset(&mut self) {
        self.mode = Mode::Type;
        self.last = false;
        self.window.reset();
        self.stored_len = 0;
        self.index = 0;
    }

    /// Restart block parsing after `sync` found a resync marker. The
    /// window contents are stale but kept; back-references across the
    /// marker are the stream producer's contract.
    pub(crate) fn resync(&mut self) {
        self.mode = Mode::Type;
        self.last = false;
        self.stored_len = 0;
        self.index = 0;
    }

    /// Bytes decoded but not yet flushed to the caller.
    pub(crate) fn pending(&self) -> usize {
        self.window.pending()
    }

    /// Drain pending output into `out`; returns bytes written.
    pub(crate) fn flush(&mut self, out: &mut [u8]) -> usize {
        self.window.flush_into(out)
    }

    /// Install a preset dictionary as initial window history.
    pub(crate) fn preload_dictionary(&mut self, dictionary: &[u8]) {
        self.window.preload(dictionary);
    }

    /// True when parsing sits at a block boundary produced by a sync
    /// flush (an empty stored block), i.e. about to read LEN/NLEN.
    pub(crate) fn sync_point(&self) -> bool {
        self.mode == Mode::Lens
    }

    fn bad(&mut self, err: OxiZlibError) -> OxiZlibError {
        self.mode = Mode::Bad;
        err
    }

    /// Advance block parsing until a buffer runs dry or the final block
    /// completes.
    pub(crate) fn run(&mut self, bits: &mut BitBuf, input: &[u8], pos: &mut usize) -> Result<BlockStatus> {
        loop {
            match self.mode {
                Mode::Type => {
                    if !bits.need(3, input, pos) {
                        return Ok(BlockStatus::NeedInput);
                    }
                    self.last = bits.take(1) == 1;
                    match bits.take(2) {
                        0 => {
                            bits.align();
                            self.mode = Mode::Lens;
                        }
                        1 => {
                            self.codes = InflateCodes::new(BlockTables::Fixed);
                            self.mode = Mode::Codes;
                        }
                        2 => self.mode = Mode::Table,
                        _ => return Err(self.bad(OxiZlibError::InvalidBlockType)),
                    }
                }

                Mode::Lens => {
                    if !bits.need(32, input, pos) {
                        return Ok(BlockStatus::NeedInput);
                    }
                    let len = bits.take(16) as u16;
                    let nlen = bits.take(16) as u16;
                    if len != !nlen {
                        return Err(self.bad(OxiZlibError::stored_length_mismatch(len, nlen)));
                    }
                    self.stored_len = len as usize;
                    self.mode = Mode::Stored;
                }

                Mode::Stored => {
                    while self.stored_len > 0 {
                        if self.window.write_avail() == 0 {
                            return Ok(BlockStatus::NeedOutput);
                        }
                        if bits.count() >= 8 {
                            // drain bytes the accumulator over-read
                            self.window.push(bits.take(8) as u8);
                            self.stored_len -= 1;
                        } else {
                            let avail = input.len() - *pos;
                            if avail == 0 {
                                return Ok(BlockStatus::NeedInput);
                            }
                            let want = self.stored_len.min(avail);
                            let n = self
                                .window
                                .extend_from_input(&input[*pos..*pos + want]);
                            *pos += n;
                            self.stored_len -= n;
                        }
                    }
                    self.mode = if self.last { Mode::Dry } else { Mode::Type };
                }

                Mode::Table => {
                    if !bits.need(14, input, pos) {
                        return Ok(BlockStatus::NeedInput);
                    }
                    self.nlen = bits.take(5) as usize + 257;
                    self.ndist = bits.take(5) as usize + 1;
                    self.ncode = bits.take(4) as usize + 4;
                    if self.nlen > 286 || self.ndist > 30 {
                        return Err(self.bad(OxiZlibError::TooManySymbols));
                    }
                    self.clen_lens = [0; CODE_LENGTH_SYMBOLS];
                    self.index = 0;
                    self.mode = Mode::BitLens;
                }

                Mode::BitLens => {
                    while self.index < self.ncode {
                        if !bits.need(3, input, pos) {
                            return Ok(BlockStatus::NeedInput);
                        }
                        self.clen_lens[CODE_LENGTH_ORDER[self.index]] = bits.take(3) as u8;
                        self.index += 1;
                    }
                    self.clen_table =
                        HuffmanTable::build(Alphabet::CodeLengths, &self.clen_lens)
                            .map_err(|e| self.bad(e))?;
                    self.lens.iter_mut().for_each(|l| *l = 0);
                    self.index = 0;
                    self.mode = Mode::CodeLens;
                }

                Mode::CodeLens => {
                    let total = self.nlen + self.ndist;
                    while self.index < total {
                        let Some((width, op)) = self.clen_table.peek_symbol(bits, input, pos)
                        else {
                            return Ok(BlockStatus::NeedInput);
                        };
                        let Op::Literal(sym) = op else {
                            return Err(self.bad(OxiZlibError::invalid_code_lengths(
                                "unused code-length symbol",
                            )));
                        };
                        match sym {
                            0..=15 => {
                                bits.drop_bits(width);
                                self.lens[self.index] = sym as u8;
                                self.index += 1;
                            }
                            16 | 17 | 18 => {
                                // repeat escapes carry 2, 3, or 7 extra
                                // bits; commit nothing until both the
                                // code and its extras are buffered
                                let (extra, base) = match sym {
                                    16 => (2u8, 3usize),
                                    17 => (3, 3),
                                    _ => (7, 11),
                                };
                                if !bits.need(width + extra, input, pos) {
                                    return Ok(BlockStatus::NeedInput);
                                }
                                bits.drop_bits(width);
                                let repeat = base + bits.take(extra) as usize;
                                let fill = if sym == 16 {
                                    if self.index == 0 {
                                        return Err(self.bad(
                                            OxiZlibError::invalid_code_lengths(
                                                "invalid bit length repeat",
                                            ),
                                        ));
                                    }
                                    self.lens[self.index - 1]
                                } else {
                                    0
                                };
                                if self.index + repeat > total {
                                    return Err(self.bad(OxiZlibError::invalid_code_lengths(
                                        "invalid bit length repeat",
                                    )));
                                }
                                for _ in 0..repeat {
                                    self.lens[self.index] = fill;
                                    self.index += 1;
                                }
                            }
                            _ => unreachable!("code-length symbols are 0..=18"),
                        }
                    }
                    if self.lens[256] == 0 {
                        return Err(self.bad(OxiZlibError::invalid_code_lengths(
                            "missing end-of-block code",
                        )));
                    }
                    let litlen = HuffmanTable::build(Alphabet::LitLen, &self.lens[..self.nlen])
                        .map_err(|e| self.bad(e))?;
                    let distance = HuffmanTable::build(
                        Alphabet::Distance,
                        &self.lens[self.nlen..self.nlen + self.ndist],
                    )
                    .map_err(|e| self.bad(e))?;
                    self.codes = InflateCodes::new(BlockTables::Dynamic { litlen, distance });
                    self.mode = Mode::Codes;
                }

                Mode::Codes => {
                    match self
                        .codes
                        .run(bits, input, pos, &mut self.window)
                        .map_err(|e| self.bad(e))?
                    {
                        Step::NeedInput => return Ok(BlockStatus::NeedInput),
                        Step::NeedOutput => return Ok(BlockStatus::NeedOutput),
                        Step::BlockDone => {
                            self.mode = if self.last { Mode::Dry } else { Mode::Type };
                        }
                    }
                }

                Mode::Dry => {
                    self.mode = Mode::Done;
                    return Ok(BlockStatus::StreamEnd);
                }

                Mode::Done => return Ok(BlockStatus::StreamEnd),

                Mode::Bad => {
                    return Err(OxiZlibError::stream(
                        "decoder halted on a previous error",
                    ));
                }
            }
        }
    }
}
