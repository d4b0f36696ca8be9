//! argbind_binder: Parameter and assignment-target binding.
//!
//! The normalizer turns raw AST nodes into spec lists; the argument binder
//! and the multiple-assignment binder turn spec lists into instruction
//! streams. Each call works on its own arena, working list and state, so
//! independent bodies can be bound on different threads.

pub mod args;
pub mod emit;
pub mod expression;
pub mod locals;
pub mod masgn;
pub mod normalizer;
pub mod spec;
pub mod state;
pub mod working_list;

pub use args::{ArgsBinder, BinderOptions};
pub use emit::Emitter;
pub use expression::{BasicLowering, LowerExpression};
pub use masgn::MasgnBinder;
pub use normalizer::Normalizer;
pub use spec::{ParameterSpec, TargetSpec, VariableKind};
pub use state::{BinderFlags, BinderState};
pub use working_list::{Side, WorkingList};

use argbind_ast::{ParameterList, TargetList};
use argbind_core::{NameInterner, SpecArena};
use argbind_diagnostics::CompileError;
use argbind_ir::Instruction;

/// Normalize and bind a parameter list with the default expression lowering.
pub fn bind_parameters(
    arena: &SpecArena,
    interner: &NameInterner,
    list: Option<&ParameterList>,
    options: BinderOptions,
) -> Result<Vec<Instruction>, CompileError> {
    let specs = Normalizer::new(arena, interner).normalize_parameters(list)?;
    ArgsBinder::new(interner, &BasicLowering, options).bind(specs)
}

/// Normalize and bind a multiple-assignment target list.
pub fn bind_targets(
    arena: &SpecArena,
    interner: &NameInterner,
    list: &TargetList,
) -> Result<Vec<Instruction>, CompileError> {
    let specs = Normalizer::new(arena, interner).normalize_targets(list)?;
    MasgnBinder::new(interner, &BasicLowering).bind(specs)
}
