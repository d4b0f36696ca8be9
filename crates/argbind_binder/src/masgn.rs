//! The multiple-assignment binder.
//!
//! `a, (b, c), *d, obj.e = value` is bound the same way as a parameter list
//! without optional or keyword parameters: targets before the splat take
//! values from the left end of the array, targets after it from the right
//! end. Variables are assigned rather than declared, so an existing outer
//! local is overwritten.

use crate::emit::Emitter;
use crate::expression::LowerExpression;
use crate::spec::{TargetSpec, VariableKind};
use crate::state::BinderState;
use crate::working_list::WorkingList;
use argbind_ast::Expression;
use argbind_core::intern::{Name, NameInterner};
use argbind_core::text::TextSpan;
use argbind_diagnostics::CompileError;
use argbind_ir::{Instruction, Op};
use tracing::{debug, trace};

pub struct MasgnBinder<'b> {
    interner: &'b NameInterner,
    lowering: &'b dyn LowerExpression,
    out: Emitter,
}

impl<'b> MasgnBinder<'b> {
    pub fn new(interner: &'b NameInterner, lowering: &'b dyn LowerExpression) -> Self {
        Self {
            interner,
            lowering,
            out: Emitter::new(),
        }
    }

    /// Bind `list` against the array on top of the stack.
    pub fn bind<'a>(
        mut self,
        list: WorkingList<'a, TargetSpec<'a>>,
    ) -> Result<Vec<Instruction>, CompileError> {
        debug!(targets = list.len(), "binding assignment targets");
        self.bind_level(list)?;
        Ok(self.out.finish())
    }

    fn bind_level<'a>(&mut self, mut list: WorkingList<'a, TargetSpec<'a>>) -> Result<(), CompileError> {
        let mut state = BinderState::new();
        let mut last_span = TextSpan::default();
        while let Some(target) = list.take(state.side) {
            last_span = target.span();
            state = self.bind_target(target, state)?;
        }
        self.out.emit(Op::Pop, last_span);
        Ok(())
    }

    fn bind_target<'a>(
        &mut self,
        target: &'a TargetSpec<'a>,
        state: BinderState,
    ) -> Result<BinderState, CompileError> {
        match *target {
            TargetSpec::Variable { kind, name, span } => {
                self.out.take_value(state.side, span);
                self.assign_variable(kind, name, span);
            }
            TargetSpec::NestedTargets { children, span } => {
                self.out.take_value(state.side, span);
                self.out.emit(Op::ToArray, span);
                self.bind_level(WorkingList::new(children))?;
            }
            TargetSpec::Rest { target, span } => {
                if let Some(target) = target {
                    self.out.emit(Op::Dup, span);
                    match *target {
                        TargetSpec::Variable { kind, name, span } => self.assign_variable(kind, name, span),
                        TargetSpec::AttributeWrite {
                            receiver,
                            writer,
                            span,
                        } => self.write_attribute(receiver, writer, span)?,
                        TargetSpec::NestedTargets { span, .. } | TargetSpec::Rest { span, .. } => {
                            return Err(CompileError::malformed(
                                "splat target must be a variable or an attribute",
                                span,
                            ))
                        }
                    }
                }
                trace!(from = %state.side, "splat target flips side");
                return Ok(state.flipped());
            }
            TargetSpec::AttributeWrite {
                receiver,
                writer,
                span,
            } => {
                self.out.take_value(state.side, span);
                self.write_attribute(receiver, writer, span)?;
            }
        }
        Ok(state)
    }

    fn assign_variable(&mut self, kind: VariableKind, name: Name, span: TextSpan) {
        let name = self.interner.resolve(name).to_string();
        let op = match kind {
            VariableKind::Local => Op::VariableSet {
                name,
                local_only: false,
            },
            VariableKind::Instance => Op::InstanceVariableSet { name },
            VariableKind::Global => Op::GlobalVariableSet { name },
        };
        self.out.emit(op, span);
    }

    /// `[value] -> []`: call the writer with the value and drop the result.
    fn write_attribute(&mut self, receiver: &Expression, writer: Name, span: TextSpan) -> Result<(), CompileError> {
        self.lowering.lower(receiver, span, &mut self.out)?;
        self.out.emit(Op::PushArgc { count: 1 }, span);
        self.out.emit(
            Op::Send {
                message: self.interner.resolve(writer).to_string(),
                receiver_is_self: matches!(receiver, Expression::SelfRef),
                attr_assign: true,
            },
            span,
        );
        self.out.emit(Op::Pop, span);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::BasicLowering;
    use crate::normalizer::Normalizer;
    use argbind_ast::builder::*;
    use argbind_ast::TargetList;
    use argbind_core::SpecArena;

    fn bind(list: &TargetList) -> Vec<String> {
        let arena = SpecArena::new();
        let interner = NameInterner::new();
        let specs = Normalizer::new(&arena, &interner)
            .normalize_targets(list)
            .unwrap();
        MasgnBinder::new(&interner, &BasicLowering)
            .bind(specs)
            .unwrap()
            .iter()
            .map(|i| i.to_string())
            .collect()
    }

    #[test]
    fn test_splat_in_the_middle() {
        assert_eq!(
            bind(&targets(vec![local("a"), splat(Some(local("b"))), local("c")])),
            vec![
                "array_shift",
                "variable_set a",
                "dup",
                "variable_set b",
                "array_pop",
                "variable_set c",
                "pop",
            ]
        );
    }

    #[test]
    fn test_variable_kinds() {
        assert_eq!(
            bind(&targets(vec![ivar_target("@a"), gvar_target("$b")])),
            vec![
                "array_shift",
                "instance_variable_set @a",
                "array_shift",
                "global_variable_set $b",
                "pop",
            ]
        );
    }

    #[test]
    fn test_nested_targets() {
        assert_eq!(
            bind(&targets(vec![nested(vec![local("a"), local("b")]), local("c")])),
            vec![
                "array_shift",
                "to_array",
                "array_shift",
                "variable_set a",
                "array_shift",
                "variable_set b",
                "pop",
                "array_shift",
                "variable_set c",
                "pop",
            ]
        );
    }

    #[test]
    fn test_attribute_targets() {
        assert_eq!(
            bind(&targets(vec![
                attr_target(lvar("obj"), "x="),
                splat(Some(attr_target(Expression::SelfRef, "rest="))),
            ])),
            vec![
                "array_shift",
                "variable_get obj",
                "push_argc 1",
                "send :x= (attr)",
                "pop",
                "dup",
                "push_self",
                "push_argc 1",
                "send :rest= to self (attr)",
                "pop",
                "pop",
            ]
        );
    }

    #[test]
    fn test_bare_splat() {
        assert_eq!(
            bind(&targets(vec![splat(None), local("z")])),
            vec!["array_pop", "variable_set z", "pop"]
        );
    }
}
