//! Instructions and their disassembly.
//!
//! Stack effects below use `[.. before] -> [.. after]`, top of stack last.
//! "Sequence" is the array the current binding level consumes; it is the
//! top of the stack unless a keyword hash is staged above it.

use crate::opcode::Opcode;
use argbind_core::text::TextSpan;
use std::fmt;

/// An operation and its operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// `[] -> [nil]`
    PushNil,
    PushTrue,
    PushFalse,
    PushInt(i64),
    PushString(String),
    PushSymbol(String),
    PushSelf,
    /// `[e1 .. en] -> [array]`
    CreateArray { count: u32 },
    /// `[k1 v1 .. kn vn] -> [hash]`, `count` is the number of pairs.
    CreateHash { count: u32 },
    VariableGet { name: String },
    /// `[v] -> []`. With `local_only` the variable is always created in the
    /// innermost scope; otherwise an existing outer variable is reassigned.
    VariableSet { name: String, local_only: bool },
    InstanceVariableGet { name: String },
    InstanceVariableSet { name: String },
    GlobalVariableGet { name: String },
    GlobalVariableSet { name: String },
    /// `[v] -> [v v]`
    Dup,
    /// `[v] -> []`
    Pop,
    /// `[seq] -> [seq first]`, removing the first element (nil when empty).
    ArrayShift,
    /// `[seq] -> [seq last]`, removing the last element (nil when empty).
    ArrayPop,
    /// `[seq] -> [seq bool]`
    ArrayIsEmpty,
    /// `[v] -> [array]`: a fresh array holding the elements of `v`. Fails
    /// with a type error when `v` cannot be coerced.
    ToArray,
    /// `[seq] -> [seq hash]`: removes the trailing element of `seq` if it is
    /// a symbol-keyed hash and pushes it, else pushes an empty hash.
    StageKeywordHash,
    /// `[hash] -> [hash bool]`
    HashHasKey { name: String },
    /// `[hash] -> [hash value]`, removing the key. Fails with a
    /// missing-keyword error when the key is absent.
    HashDelete { name: String },
    /// `[hash] -> [hash]`. Fails with an unknown-keyword error naming every
    /// remaining key when the hash is not empty.
    CheckExtraKeywords,
    /// Sets the call-argument register.
    PushArgc { count: u32 },
    /// `[a1 .. an receiver] -> [result]` with `n` taken from the call-argument
    /// register. With `attr_assign` the result is the last argument rather
    /// than the method's return value.
    Send {
        message: String,
        receiver_is_self: bool,
        attr_assign: bool,
    },
    /// `[bool] -> []`, runs the following block when the value is truthy.
    If,
    Else,
    End,
}

impl Op {
    pub fn opcode(&self) -> Opcode {
        match self {
            Op::PushNil => Opcode::PushNil,
            Op::PushTrue => Opcode::PushTrue,
            Op::PushFalse => Opcode::PushFalse,
            Op::PushInt(_) => Opcode::PushInt,
            Op::PushString(_) => Opcode::PushString,
            Op::PushSymbol(_) => Opcode::PushSymbol,
            Op::PushSelf => Opcode::PushSelf,
            Op::CreateArray { .. } => Opcode::CreateArray,
            Op::CreateHash { .. } => Opcode::CreateHash,
            Op::VariableGet { .. } => Opcode::VariableGet,
            Op::VariableSet { .. } => Opcode::VariableSet,
            Op::InstanceVariableGet { .. } => Opcode::InstanceVariableGet,
            Op::InstanceVariableSet { .. } => Opcode::InstanceVariableSet,
            Op::GlobalVariableGet { .. } => Opcode::GlobalVariableGet,
            Op::GlobalVariableSet { .. } => Opcode::GlobalVariableSet,
            Op::Dup => Opcode::Dup,
            Op::Pop => Opcode::Pop,
            Op::ArrayShift => Opcode::ArrayShift,
            Op::ArrayPop => Opcode::ArrayPop,
            Op::ArrayIsEmpty => Opcode::ArrayIsEmpty,
            Op::ToArray => Opcode::ToArray,
            Op::StageKeywordHash => Opcode::StageKeywordHash,
            Op::HashHasKey { .. } => Opcode::HashHasKey,
            Op::HashDelete { .. } => Opcode::HashDelete,
            Op::CheckExtraKeywords => Opcode::CheckExtraKeywords,
            Op::PushArgc { .. } => Opcode::PushArgc,
            Op::Send { .. } => Opcode::Send,
            Op::If => Opcode::If,
            Op::Else => Opcode::Else,
            Op::End => Opcode::End,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match self {
            Op::PushInt(value) => write!(f, "{} {}", mnemonic, value),
            Op::PushString(value) => write!(f, "{} {:?}", mnemonic, value),
            Op::PushSymbol(value) => write!(f, "{} :{}", mnemonic, value),
            Op::CreateArray { count } | Op::CreateHash { count } | Op::PushArgc { count } => {
                write!(f, "{} {}", mnemonic, count)
            }
            Op::VariableSet { name, local_only } => {
                write!(f, "{} {}", mnemonic, name)?;
                if *local_only {
                    f.write_str(" (local)")?;
                }
                Ok(())
            }
            Op::VariableGet { name }
            | Op::InstanceVariableGet { name }
            | Op::InstanceVariableSet { name }
            | Op::GlobalVariableGet { name }
            | Op::GlobalVariableSet { name } => write!(f, "{} {}", mnemonic, name),
            Op::HashHasKey { name } | Op::HashDelete { name } => write!(f, "{} :{}", mnemonic, name),
            Op::Send {
                message,
                receiver_is_self,
                attr_assign,
            } => {
                write!(f, "{} :{}", mnemonic, message)?;
                if *receiver_is_self {
                    f.write_str(" to self")?;
                }
                if *attr_assign {
                    f.write_str(" (attr)")?;
                }
                Ok(())
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
            | Op::End => f.write_str(mnemonic),
        }
    }
}

/// One emitted instruction. Never mutated after emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Op,
    /// Span of the declaration that produced this instruction.
    pub span: TextSpan,
}

impl Instruction {
    pub fn new(op: Op, span: TextSpan) -> Self {
        Self { op, span }
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.op.opcode()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.op, f)
    }
}

/// Render a stream as a numbered listing, indenting `if`/`else` blocks.
pub fn disassemble(stream: &[Instruction]) -> String {
    let mut out = String::new();
    let mut depth: usize = 0;
    for (index, instruction) in stream.iter().enumerate() {
        let indent = match instruction.op {
            Op::Else | Op::End => depth.saturating_sub(1),
            _ => depth,
        };
        out.push_str(&format!(
            "{:>4} {}{}\n",
            index,
            "  ".repeat(indent),
            instruction
        ));
        match instruction.op {
            Op::If => depth += 1,
            Op::End => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    out
}
