//! The argument binder.
//!
//! Lowers a normalized parameter list into instructions that bind the
//! call-time arguments. The incoming arguments are an array on top of the
//! stack. Specs are consumed from both ends of the list: required parameters
//! on the right of a rest take values from the right end of the array, the
//! ones on the left take them from the left end. Optional parameters wait
//! until no required or keyword parameter remains and then bind left to
//! right, each one falling back to its default when the array has run dry.
//!
//! Keyword parameters share one hash that is moved off the end of the array
//! and onto the stack the first time a keyword is bound. That hash is
//! checked for unknown keys and dropped before the next positional value is
//! taken, or when the level is done.

use crate::emit::Emitter;
use crate::expression::LowerExpression;
use crate::spec::ParameterSpec;
use crate::state::{BinderFlags, BinderState};
use crate::working_list::{Side, WorkingList};
use argbind_ast::visitor::reads_local;
use argbind_ast::Expression;
use argbind_core::intern::{Name, NameInterner};
use argbind_core::text::TextSpan;
use argbind_diagnostics::CompileError;
use argbind_ir::{Instruction, Op};
use tracing::{debug, trace};

/// Consecutive specs that may be put back without binding anything. A
/// normalized list needs at most two (optional deferred to the right end,
/// then sent back to the left).
const MAX_DEFERRALS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderOptions {
    /// Always create parameters in the innermost scope. `for` loops turn
    /// this off so their variables can reassign outer ones.
    pub local_only: bool,
}

impl Default for BinderOptions {
    fn default() -> Self {
        Self { local_only: true }
    }
}

pub struct ArgsBinder<'b> {
    interner: &'b NameInterner,
    lowering: &'b dyn LowerExpression,
    options: BinderOptions,
    out: Emitter,
}

impl<'b> ArgsBinder<'b> {
    pub fn new(
        interner: &'b NameInterner,
        lowering: &'b dyn LowerExpression,
        options: BinderOptions,
    ) -> Self {
        Self {
            interner,
            lowering,
            options,
            out: Emitter::new(),
        }
    }

    /// Bind `list` and return the finished instruction stream.
    pub fn bind<'a>(
        mut self,
        list: WorkingList<'a, ParameterSpec<'a>>,
    ) -> Result<Vec<Instruction>, CompileError> {
        debug!(
            parameters = list.len(),
            local_only = self.options.local_only,
            "binding parameter list"
        );
        self.bind_level(list, self.options.local_only)?;
        Ok(self.out.finish())
    }

    /// Bind one level against the sequence on top of the stack, then pop it.
    fn bind_level<'a>(
        &mut self,
        mut list: WorkingList<'a, ParameterSpec<'a>>,
        local_only: bool,
    ) -> Result<(), CompileError> {
        let mut state = BinderState::new();
        let mut last_span = TextSpan::default();
        let mut deferrals = 0;

        while !list.is_empty() {
            let before = list.len();
            let Some(spec) = list.take(state.side) else {
                break;
            };
            last_span = spec.span();
            state = self.bind_spec(spec, state, &mut list, local_only)?;

            if list.len() == before {
                deferrals += 1;
                if deferrals > MAX_DEFERRALS {
                    return Err(CompileError::malformed(
                        "parameters cannot be bound in any order",
                        last_span,
                    ));
                }
            } else {
                deferrals = 0;
            }
        }

        state = self.clean_up_keyword_hash(state, last_span);
        debug_assert!(!state.keyword_hash_staged());
        self.out.emit(Op::Pop, last_span);
        Ok(())
    }

    /// Bind one spec taken from `state.side`. The spec may be put back on the
    /// list, in which case the returned state faces the other end.
    fn bind_spec<'a>(
        &mut self,
        spec: &'a ParameterSpec<'a>,
        state: BinderState,
        list: &mut WorkingList<'a, ParameterSpec<'a>>,
        local_only: bool,
    ) -> Result<BinderState, CompileError> {
        match *spec {
            ParameterSpec::Required { name, span } => {
                let state = self.clean_up_keyword_hash(state, span);
                self.out.take_value(state.side, span);
                self.set_variable(name, local_only, span);
                Ok(state)
            }

            ParameterSpec::Optional {
                name,
                default,
                span,
            } => {
                let blocked = list.any(|s| s.is_required_positional() || s.is_keyword());
                if blocked {
                    trace!(side = %state.side, "optional parameter deferred");
                    list.restore(state.side);
                    return Ok(state.flipped());
                }
                if state.side == Side::Right {
                    trace!("optional parameter sent back to the left");
                    list.restore(Side::Right);
                    return Ok(state.flipped());
                }
                self.check_circular(name, default, span)?;
                let state = self.clean_up_keyword_hash(state, span);
                self.out.emit(Op::ArrayIsEmpty, span);
                self.out.emit(Op::If, span);
                self.lowering.lower(default, span, &mut self.out)?;
                self.out.emit(Op::Else, span);
                self.out.emit(Op::ArrayShift, span);
                self.out.emit(Op::End, span);
                self.set_variable(name, local_only, span);
                Ok(state)
            }

            ParameterSpec::Rest { name, span } => {
                let state = self.clean_up_keyword_hash(state, span);
                if let Some(name) = name {
                    // Aliases the sequence: later takes shrink the rest.
                    self.out.emit(Op::Dup, span);
                    self.set_variable(name, local_only, span);
                }
                trace!(from = %state.side, "rest parameter flips side");
                Ok(state.flipped())
            }

            ParameterSpec::Keyword {
                name,
                default,
                span,
            } => {
                let state = self.stage_keyword_hash(state, span);
                let key = self.resolve(name);
                match default {
                    Some(default) => {
                        self.check_circular(name, default, span)?;
                        self.out.emit(Op::HashHasKey { name: key.clone() }, span);
                        self.out.emit(Op::If, span);
                        self.out.emit(Op::HashDelete { name: key }, span);
                        self.out.emit(Op::Else, span);
                        self.lowering.lower(default, span, &mut self.out)?;
                        self.out.emit(Op::End, span);
                    }
                    None => self.out.emit(Op::HashDelete { name: key }, span),
                }
                self.set_variable(name, local_only, span);
                Ok(state)
            }

            ParameterSpec::KeywordRest { name, span } => {
                let state = self.stage_keyword_hash(state, span);
                if let Some(name) = name {
                    self.out.emit(Op::Dup, span);
                    self.set_variable(name, local_only, span);
                }
                Ok(state.with(BinderFlags::KEYWORD_REST_SEEN))
            }

            ParameterSpec::Destructure { children, span } => {
                let state = self.clean_up_keyword_hash(state, span);
                self.out.take_value(state.side, span);
                self.out.emit(Op::Dup, span);
                self.out.emit(Op::ToArray, span);
                self.bind_level(WorkingList::new(children), true)?;
                self.out.emit(Op::Pop, span);
                Ok(state)
            }

            ParameterSpec::PostSplatAttr {
                receiver,
                writer,
                span,
            } => {
                let state = self.clean_up_keyword_hash(state, span);
                self.out.take_value(state.side, span);
                self.lowering.lower(receiver, span, &mut self.out)?;
                let message = self.resolve(writer);
                self.out.emit(Op::PushArgc { count: 1 }, span);
                self.out.emit(
                    Op::Send {
                        message,
                        receiver_is_self: matches!(receiver, Expression::SelfRef),
                        attr_assign: true,
                    },
                    span,
                );
                self.out.emit(Op::Pop, span);
                Ok(state)
            }
        }
    }

    /// Move the keyword hash onto the stack unless it is already there.
    fn stage_keyword_hash(&mut self, state: BinderState, span: TextSpan) -> BinderState {
        if state.keyword_hash_staged() {
            return state;
        }
        self.out.emit(Op::StageKeywordHash, span);
        state.with(BinderFlags::KEYWORD_HASH_STAGED)
    }

    /// Check and drop a staged keyword hash. A no-op when nothing is staged.
    fn clean_up_keyword_hash(&mut self, state: BinderState, span: TextSpan) -> BinderState {
        if !state.keyword_hash_staged() {
            return state;
        }
        if !state.keyword_rest_seen() {
            self.out.emit(Op::CheckExtraKeywords, span);
        }
        self.out.emit(Op::Pop, span);
        state.without(BinderFlags::KEYWORD_HASH_STAGED)
    }

    fn check_circular(&self, name: Name, default: &Expression, span: TextSpan) -> Result<(), CompileError> {
        let text = self.interner.resolve(name);
        if reads_local(default, text) {
            return Err(CompileError::CircularArgumentReference {
                name: text.to_string(),
                span,
            });
        }
        Ok(())
    }

    fn set_variable(&mut self, name: Name, local_only: bool, span: TextSpan) {
        let name = self.resolve(name);
        self.out.emit(Op::VariableSet { name, local_only }, span);
    }

    #[inline]
    fn resolve(&self, name: Name) -> String {
        self.interner.resolve(name).to_string()
    }
}
