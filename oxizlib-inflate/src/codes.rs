//! Symbol-level decoding within one compressed DEFLATE block.
//!
//! [`InflateCodes`] drives the literal/length and distance tables of a
//! single block, turning decoded symbols into window writes: literals are
//! pushed directly, length/distance pairs become sliding-window copies.
//! Every await point - a code mid-decode, extra bits, a full window - is a
//! distinct mode so the engine can suspend with one byte of input or
//! output available and resume without losing a bit.

use crate::huffman::{HuffmanTable, Op, fixed_distance, fixed_litlen};
use oxizlib_core::bitbuf::BitBuf;
use oxizlib_core::error::{OxiZlibError, Result};
use oxizlib_core::window::Window;

/// Why a decoding step stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Input slice exhausted mid-symbol.
    NeedInput,
    /// Window full; the caller must flush before decoding continues.
    NeedOutput,
    /// End-of-block symbol consumed.
    BlockDone,
}

/// The Huffman tables in force for the current block.
#[derive(Debug, Clone)]
pub(crate) enum BlockTables {
    /// The fixed tables of RFC 1951 section 3.2.6.
    Fixed,
    /// Tables built from the block's transmitted code lengths.
    Dynamic {
        litlen: HuffmanTable,
        distance: HuffmanTable,
    },
}

impl BlockTables {
    fn litlen(&self) -> &HuffmanTable {
        match self {
            BlockTables::Fixed => fixed_litlen(),
            BlockTables::Dynamic { litlen, .. } => litlen,
        }
    }

    fn distance(&self) -> &HuffmanTable {
        match self {
            BlockTables::Fixed => fixed_distance(),
            BlockTables::Dynamic { distance, .. } => distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Decode the next literal/length symbol.
    Len,
    /// Push a decoded literal once window space exists.
    Lit(u8),
    /// Read the extra bits of a length code.
    LenExt,
    /// Decode the distance symbol.
    Dist,
    /// Read the extra bits of a distance code.
    DistExt,
    /// Copy match bytes from history (resumable when the window fills).
    Copy,
    /// Hand whole buffered bytes back to the input before finishing.
    Wash,
}

/// Suspendable literal/match decoder for one block.
#[derive(Debug, Clone)]
pub(crate) struct InflateCodes {
    mode: Mode,
    tables: BlockTables,
    /// Base value of the length/distance code being extended.
    base: u16,
    /// Extra bits still to read for `base`.
    extra: u8,
    /// Match length remaining to copy.
    length: usize,
    /// Match distance.
    distance: usize,
}

impl InflateCodes {
    pub(crate) fn new(tables: BlockTables) -> Self {
        Self {
            mode: Mode::Len,
            tables,
            base: 0,
            extra: 0,
            length: 0,
            distance: 0,
        }
    }

    /// Decode symbols until the block ends or a buffer runs dry.
    pub(crate) fn run(
        &mut self,
        bits: &mut BitBuf,
        input: &[u8],
        pos: &mut usize,
        window: &mut Window,
    ) -> Result<Step> {
        loop {
            match self.mode {
                Mode::Len => match self.tables.litlen().decode(bits, input, pos) {
                    None => return Ok(Step::NeedInput),
                    Some(Op::Literal(byte)) => self.mode = Mode::Lit(byte as u8),
                    Some(Op::EndOfBlock) => self.mode = Mode::Wash,
                    Some(Op::Base { base, extra }) => {
                        self.base = base;
                        self.extra = extra;
                        self.mode = Mode::LenExt;
                    }
                    Some(Op::Invalid) => return Err(OxiZlibError::InvalidLiteralLengthCode),
                    Some(Op::Link { .. }) => unreachable!("links resolve inside decode"),
                },

                Mode::Lit(byte) => {
                    if window.write_avail() == 0 {
                        return Ok(Step::NeedOutput);
                    }
                    window.push(byte);
                    self.mode = Mode::Len;
                }

                Mode::LenExt => {
                    if !bits.need(self.extra, input, pos) {
                        return Ok(Step::NeedInput);
                    }
                    self.length = self.base as usize + bits.take(self.extra) as usize;
                    self.mode = Mode::Dist;
                }

                Mode::Dist => match self.tables.distance().decode(bits, input, pos) {
                    None => return Ok(Step::NeedInput),
                    Some(Op::Base { base, extra }) => {
                        self.base = base;
                        self.extra = extra;
                        self.mode = Mode::DistExt;
                    }
                    Some(Op::Invalid) => return Err(OxiZlibError::InvalidDistanceCode),
                    Some(_) => unreachable!("distance tables hold only distances"),
                },

                Mode::DistExt => {
                    if !bits.need(self.extra, input, pos) {
                        return Ok(Step::NeedInput);
                    }
                    self.distance = self.base as usize + bits.take(self.extra) as usize;
                    self.mode = Mode::Copy;
                }

                Mode::Copy => {
                    if window.write_avail() == 0 {
                        return Ok(Step::NeedOutput);
                    }
                    let copied = window.copy_match(self.distance, self.length)?;
                    self.length -= copied;
                    if self.length > 0 {
                        return Ok(Step::NeedOutput);
                    }
                    self.mode = Mode::Len;
                }

                Mode::Wash => {
                    // Whole bytes still in the accumulator belong to the
                    // next block header or the container trailer; give
                    // them back to the input cursor.
                    bits.rewind_bytes(pos);
                    self.mode = Mode::Len;
                    return Ok(Step::BlockDone);
                }
            }
        }
    }
}
