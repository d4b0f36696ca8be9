//! Binary encoding of instruction streams.
//!
//! Each instruction is written as:
//!
//! ```text
//! opcode: u8 | payload length: ber | payload
//! payload = span.start: ber | span.length: ber | operands...
//! ```
//!
//! Operands: strings are a BER length followed by UTF-8 bytes, unsigned
//! integers are BER, signed integers are zig-zag mapped then BER, booleans
//! are a single `0` or `1` byte. Encoding is canonical: encoding the same
//! stream twice yields identical bytes, and `decode(encode(s)) == s`.

use crate::instruction::{Instruction, Op};
use crate::opcode::Opcode;
use crate::varint::{read_ber, write_ber, zigzag_decode, zigzag_encode, VarintError};
use argbind_core::text::TextSpan;

/// A cache record that cannot be turned back into instructions. Fatal to
/// that record only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}")]
    Truncated { offset: usize },

    #[error("unknown opcode {byte:#04x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("variable-length integer overflows at offset {offset}")]
    Overflow { offset: usize },

    #[error("invalid UTF-8 in operand at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid boolean byte {byte} at offset {offset}")]
    InvalidBool { byte: u8, offset: usize },

    #[error("`{opcode}` payload has {extra} unread bytes at offset {offset}")]
    TrailingOperandBytes {
        opcode: Opcode,
        extra: usize,
        offset: usize,
    },
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a whole stream.
pub fn encode(stream: &[Instruction]) -> Vec<u8> {
    let mut out = Vec::with_capacity(stream.len() * 4);
    for instruction in stream {
        encode_instruction(instruction, &mut out);
    }
    out
}

/// Append one encoded instruction to `out`.
pub fn encode_instruction(instruction: &Instruction, out: &mut Vec<u8>) {
    let mut payload = Encoder::default();
    payload.write_u32(instruction.span.start);
    payload.write_u32(instruction.span.length);
    payload.write_operands(&instruction.op);

    out.push(instruction.opcode().as_u8());
    write_ber(out, payload.buf.len() as u64);
    out.extend_from_slice(&payload.buf);
}

#[derive(Default)]
struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn write_u32(&mut self, v: u32) {
        write_ber(&mut self.buf, u64::from(v));
    }

    fn write_i64(&mut self, v: i64) {
        write_ber(&mut self.buf, zigzag_encode(v));
    }

    fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    fn write_string(&mut self, s: &str) {
        write_ber(&mut self.buf, s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn write_operands(&mut self, op: &Op) {
        match op {
            Op::PushInt(value) => self.write_i64(*value),
            Op::PushString(value) | Op::PushSymbol(value) => self.write_string(value),
            Op::CreateArray { count } | Op::CreateHash { count } | Op::PushArgc { count } => {
                self.write_u32(*count)
            }
            Op::VariableSet { name, local_only } => {
                self.write_string(name);
                self.write_bool(*local_only);
            }
            Op::VariableGet { name }
            | Op::InstanceVariableGet { name }
            | Op::InstanceVariableSet { name }
            | Op::GlobalVariableGet { name }
            | Op::GlobalVariableSet { name }
            | Op::HashHasKey { name }
            | Op::HashDelete { name } => self.write_string(name),
            Op::Send {
                message,
                receiver_is_self,
                attr_assign,
            } => {
                self.write_string(message);
                self.write_bool(*receiver_is_self);
                self.write_bool(*attr_assign);
            }
            Op::PushNil
            | Op::PushTrue
            | Op::PushFalse
            | Op::PushSelf
            | Op::Dup
            | Op::Pop
            | Op::ArrayShift
            | Op::ArrayPop
            | Op::ArrayIsEmpty
            | Op::ToArray
            | Op::StageKeywordHash
            | Op::CheckExtraKeywords
            | Op::If
            | Op::Else
            | Op::End => {}
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a whole stream. Any error invalidates the entire stream.
pub fn decode(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let mut dec = Decoder::new(bytes, 0);
    let mut stream = Vec::new();
    while dec.remaining() > 0 {
        stream.push(decode_instruction(&mut dec)?);
    }
    Ok(stream)
}

/// Decode the instruction at the decoder's position.
pub fn decode_instruction(dec: &mut Decoder<'_>) -> Result<Instruction, DecodeError> {
    let opcode_offset = dec.offset();
    let byte = dec.read_u8()?;
    let opcode = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode {
        byte,
        offset: opcode_offset,
    })?;
    let len = dec.read_len()?;
    let payload_offset = dec.offset();
    let payload = dec.read_exact(len)?;

    let mut operands = Decoder::new(payload, payload_offset);
    let start = operands.read_u32()?;
    let length = operands.read_u32()?;
    let op = operands.read_operands(opcode)?;
    if operands.remaining() != 0 {
        return Err(DecodeError::TrailingOperandBytes {
            opcode,
            extra: operands.remaining(),
            offset: operands.offset(),
        });
    }
    Ok(Instruction::new(op, TextSpan::new(start, length)))
}

/// Cursor over encoded bytes. `base` is the absolute offset of `bytes[0]`,
/// so errors inside a payload still report positions in the whole record.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, pos: 0, base }
    }

    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                offset: self.base + self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn expect_bytes(&mut self, expected: &[u8]) -> Result<bool, DecodeError> {
        Ok(self.read_exact(expected.len())? == expected)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_ber(&mut self) -> Result<u64, DecodeError> {
        let offset = self.offset();
        match read_ber(&self.bytes[self.pos..]) {
            Ok((value, consumed)) => {
                self.pos += consumed;
                Ok(value)
            }
            Err(VarintError::Truncated) => Err(DecodeError::Truncated {
                offset: self.base + self.bytes.len(),
            }),
            Err(VarintError::Overflow) => Err(DecodeError::Overflow { offset }),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let offset = self.offset();
        let value = self.read_ber()?;
        u32::try_from(value).map_err(|_| DecodeError::Overflow { offset })
    }

    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let offset = self.offset();
        let value = self.read_ber()?;
        usize::try_from(value).map_err(|_| DecodeError::Overflow { offset })
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(zigzag_decode(self.read_ber()?))
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.offset();
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidBool { byte, offset }),
        }
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_len()?;
        let offset = self.offset();
        let bytes = self.read_exact(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn read_operands(&mut self, opcode: Opcode) -> Result<Op, DecodeError> {
        Ok(match opcode {
            Opcode::PushNil => Op::PushNil,
            Opcode::PushTrue => Op::PushTrue,
            Opcode::PushFalse => Op::PushFalse,
            Opcode::PushInt => Op::PushInt(self.read_i64()?),
            Opcode::PushString => Op::PushString(self.read_string()?),
            Opcode::PushSymbol => Op::PushSymbol(self.read_string()?),
            Opcode::PushSelf => Op::PushSelf,
            Opcode::CreateArray => Op::CreateArray {
                count: self.read_u32()?,
            },
            Opcode::CreateHash => Op::CreateHash {
                count: self.read_u32()?,
            },
            Opcode::VariableGet => Op::VariableGet {
                name: self.read_string()?,
            },
            Opcode::VariableSet => Op::VariableSet {
                name: self.read_string()?,
                local_only: self.read_bool()?,
            },
            Opcode::InstanceVariableGet => Op::InstanceVariableGet {
                name: self.read_string()?,
            },
            Opcode::InstanceVariableSet => Op::InstanceVariableSet {
                name: self.read_string()?,
            },
            Opcode::GlobalVariableGet => Op::GlobalVariableGet {
                name: self.read_string()?,
            },
            Opcode::GlobalVariableSet => Op::GlobalVariableSet {
                name: self.read_string()?,
            },
            Opcode::Dup => Op::Dup,
            Opcode::Pop => Op::Pop,
            Opcode::ArrayShift => Op::ArrayShift,
            Opcode::ArrayPop => Op::ArrayPop,
            Opcode::ArrayIsEmpty => Op::ArrayIsEmpty,
            Opcode::ToArray => Op::ToArray,
            Opcode::StageKeywordHash => Op::StageKeywordHash,
            Opcode::HashHasKey => Op::HashHasKey {
                name: self.read_string()?,
            },
            Opcode::HashDelete => Op::HashDelete {
                name: self.read_string()?,
            },
            Opcode::CheckExtraKeywords => Op::CheckExtraKeywords,
            Opcode::PushArgc => Op::PushArgc {
                count: self.read_u32()?,
            },
            Opcode::Send => Op::Send {
                message: self.read_string()?,
                receiver_is_self: self.read_bool()?,
                attr_assign: self.read_bool()?,
            },
            Opcode::If => Op::If,
            Opcode::Else => Op::Else,
            Opcode::End => Op::End,
        })
    }
}
