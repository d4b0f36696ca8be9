//! Instruction buffer shared by the binders.

use crate::working_list::Side;
use argbind_core::text::TextSpan;
use argbind_ir::{Instruction, Op};

/// Append-only instruction buffer.
#[derive(Debug, Default)]
pub struct Emitter {
    instructions: Vec<Instruction>,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    #[inline]
    pub fn emit(&mut self, op: Op, span: TextSpan) {
        self.instructions.push(Instruction::new(op, span));
    }

    /// Take the next value from `side` of the sequence on top of the stack.
    #[inline]
    pub fn take_value(&mut self, side: Side, span: TextSpan) {
        let op = match side {
            Side::Left => Op::ArrayShift,
            Side::Right => Op::ArrayPop,
        };
        self.emit(op, span);
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.instructions
    }
}
