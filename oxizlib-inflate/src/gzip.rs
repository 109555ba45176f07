//! gzip (RFC 1952) header parsing.
//!
//! The gzip member header is variable length: a 10-byte fixed part, then
//! optional extra field, file name, comment, and a CRC16 over the header
//! itself, each gated by a FLG bit. [`GzipHeaderSkipper`] consumes the
//! header byte by byte through the shared bit accumulator so it can
//! suspend at any point, validates the fixed fields, and checks the
//! header CRC when present. Field contents are skipped, not retained.

use oxizlib_core::bitbuf::BitBuf;
use oxizlib_core::checksum::Crc32;
use oxizlib_core::error::{OxiZlibError, Result};

/// gzip magic bytes.
pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// FLG bit: header CRC16 present.
const FHCRC: u8 = 0x02;
/// FLG bit: extra field present.
const FEXTRA: u8 = 0x04;
/// FLG bit: zero-terminated file name present.
const FNAME: u8 = 0x08;
/// FLG bit: zero-terminated comment present.
const FCOMMENT: u8 = 0x10;
/// FLG bits reserved by RFC 1952.
const RESERVED: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// The 10 fixed bytes: magic, CM, FLG, MTIME, XFL, OS.
    Fixed { index: u8 },
    /// XLEN low byte.
    ExtraLenLo,
    /// XLEN high byte.
    ExtraLenHi { low: u8 },
    /// Extra-field payload.
    Extra { remaining: u16 },
    /// Zero-terminated original file name.
    Name,
    /// Zero-terminated comment.
    Comment,
    /// CRC16 low byte. The CRC over preceding header bytes is frozen in
    /// `computed` when this state is entered.
    HeaderCrcLo { computed: u16 },
    /// CRC16 high byte.
    HeaderCrcHi { computed: u16, low: u8 },
    /// Header fully consumed.
    Done,
}

/// Suspendable gzip header consumer.
#[derive(Debug, Clone)]
pub(crate) struct GzipHeaderSkipper {
    state: State,
    /// FLG byte, once read.
    flags: u8,
    /// Running CRC-32 over header bytes, for the FHCRC check.
    crc: Crc32,
}

/// Pull one aligned byte through the accumulator; `None` suspends.
fn next_byte(bits: &mut BitBuf, input: &[u8], pos: &mut usize) -> Option<u8> {
    if !bits.need(8, input, pos) {
        return None;
    }
    Some(bits.take(8) as u8)
}

impl GzipHeaderSkipper {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Fixed { index: 0 },
            flags: 0,
            crc: Crc32::new(),
        }
    }

    /// Consume header bytes; `Ok(true)` once the whole header is read,
    /// `Ok(false)` to suspend for more input.
    pub(crate) fn run(&mut self, bits: &mut BitBuf, input: &[u8], pos: &mut usize) -> Result<bool> {
        loop {
            match self.state {
                State::Fixed { index } => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.crc.update(&[byte]);
                    match index {
                        0 | 1 => {
                            if byte != GZIP_MAGIC[index as usize] {
                                return Err(OxiZlibError::invalid_magic(GZIP_MAGIC, [byte]));
                            }
                        }
                        2 => {
                            if byte != 8 {
                                return Err(OxiZlibError::unsupported_method(byte));
                            }
                        }
                        3 => {
                            if byte & RESERVED != 0 {
                                return Err(OxiZlibError::InvalidHeaderFlags { flags: byte });
                            }
                            self.flags = byte;
                        }
                        // MTIME, XFL, OS carry no constraints
                        _ => {}
                    }
                    self.state = if index == 9 {
                        self.after_fixed()
                    } else {
                        State::Fixed { index: index + 1 }
                    };
                }

                State::ExtraLenLo => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.crc.update(&[byte]);
                    self.state = State::ExtraLenHi { low: byte };
                }

                State::ExtraLenHi { low } => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.crc.update(&[byte]);
                    let len = u16::from(byte) << 8 | u16::from(low);
                    self.state = if len == 0 {
                        self.after_extra()
                    } else {
                        State::Extra { remaining: len }
                    };
                }

                State::Extra { remaining } => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.crc.update(&[byte]);
                    self.state = if remaining == 1 {
                        self.after_extra()
                    } else {
                        State::Extra {
                            remaining: remaining - 1,
                        }
                    };
                }

                State::Name => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.crc.update(&[byte]);
                    if byte == 0 {
                        self.state = self.after_name();
                    }
                }

                State::Comment => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.crc.update(&[byte]);
                    if byte == 0 {
                        self.state = self.after_comment();
                    }
                }

                State::HeaderCrcLo { computed } => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    self.state = State::HeaderCrcHi {
                        computed,
                        low: byte,
                    };
                }

                State::HeaderCrcHi { computed, low } => {
                    let Some(byte) = next_byte(bits, input, pos) else {
                        return Ok(false);
                    };
                    let stored = u16::from(byte) << 8 | u16::from(low);
                    if stored != computed {
                        return Err(OxiZlibError::checksum_mismatch(
                            u32::from(stored),
                            u32::from(computed),
                        ));
                    }
                    self.state = State::Done;
                }

                State::Done => return Ok(true),
            }
        }
    }

    fn after_fixed(&self) -> State {
        if self.flags & FEXTRA != 0 {
            State::ExtraLenLo
        } else {
            self.after_extra()
        }
    }

    fn after_extra(&self) -> State {
        if self.flags & FNAME != 0 {
            State::Name
        } else {
            self.after_name()
        }
    }

    fn after_name(&self) -> State {
        if self.flags & FCOMMENT != 0 {
            State::Comment
        } else {
            self.after_comment()
        }
    }

    fn after_comment(&self) -> State {
        if self.flags & FHCRC != 0 {
            State::HeaderCrcLo {
                computed: (self.crc.finish() & 0xFFFF) as u16,
            }
        } else {
            State::Done
        }
    }
}
