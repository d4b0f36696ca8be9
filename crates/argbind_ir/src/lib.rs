//! argbind_ir: The instruction stream.
//!
//! Instructions are what the binders emit and what the abstract machine,
//! a native-code emitter, or the compilation cache consume. This crate
//! defines the instruction set, its disassembly, and its binary encoding.
//!
//! Opcode numbers are part of the cache format. Never renumber an opcode;
//! add new ones at unused numbers and bump [`FORMAT_VERSION`].

mod instruction;
mod opcode;
pub mod serialize;
pub mod varint;

pub use instruction::{disassemble, Instruction, Op};
pub use opcode::Opcode;
pub use serialize::{decode, decode_instruction, encode, encode_instruction, DecodeError};

/// Version of the binary instruction encoding.
pub const FORMAT_VERSION: u32 = 1;
