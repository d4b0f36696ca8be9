//! Lowering of default values and attribute receivers.
//!
//! The binders do not know how expressions are compiled. They hand every
//! default-value and receiver expression to a [`LowerExpression`]
//! implementation, which must leave exactly one value on the stack.

use crate::emit::Emitter;
use argbind_ast::Expression;
use argbind_core::text::TextSpan;
use argbind_diagnostics::CompileError;
use argbind_ir::Op;

pub trait LowerExpression {
    /// Emit instructions that push the value of `expr`. `span` is the span
    /// of the parameter or target the expression belongs to.
    fn lower(&self, expr: &Expression, span: TextSpan, out: &mut Emitter) -> Result<(), CompileError>;
}

/// Lowers literals, variable reads, array and hash literals, and calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicLowering;

impl LowerExpression for BasicLowering {
    fn lower(&self, expr: &Expression, span: TextSpan, out: &mut Emitter) -> Result<(), CompileError> {
        match expr {
            Expression::Nil => out.emit(Op::PushNil, span),
            Expression::True => out.emit(Op::PushTrue, span),
            Expression::False => out.emit(Op::PushFalse, span),
            Expression::SelfRef => out.emit(Op::PushSelf, span),
            Expression::Integer { value } => out.emit(Op::PushInt(*value), span),
            Expression::String { value } => out.emit(Op::PushString(value.clone()), span),
            Expression::Symbol { value } => out.emit(Op::PushSymbol(value.clone()), span),
            Expression::LocalVariable { name } => out.emit(Op::VariableGet { name: name.clone() }, span),
            Expression::InstanceVariable { name } => {
                out.emit(Op::InstanceVariableGet { name: name.clone() }, span)
            }
            Expression::GlobalVariable { name } => {
                out.emit(Op::GlobalVariableGet { name: name.clone() }, span)
            }
            Expression::Array { elements } => {
                for element in elements {
                    self.lower(element, span, out)?;
                }
                out.emit(
                    Op::CreateArray {
                        count: count(elements.len(), span)?,
                    },
                    span,
                );
            }
            Expression::Hash { pairs } => {
                for (key, value) in pairs {
                    self.lower(key, span, out)?;
                    self.lower(value, span, out)?;
                }
                out.emit(
                    Op::CreateHash {
                        count: count(pairs.len(), span)?,
                    },
                    span,
                );
            }
            Expression::Call {
                receiver,
                method,
                arguments,
            } => {
                for argument in arguments {
                    self.lower(argument, span, out)?;
                }
                match receiver {
                    Some(receiver) => self.lower(receiver, span, out)?,
                    None => out.emit(Op::PushSelf, span),
                }
                out.emit(
                    Op::PushArgc {
                        count: count(arguments.len(), span)?,
                    },
                    span,
                );
                out.emit(
                    Op::Send {
                        message: method.clone(),
                        receiver_is_self: receiver.is_none(),
                        attr_assign: false,
                    },
                    span,
                );
            }
        }
        Ok(())
    }
}

fn count(len: usize, span: TextSpan) -> Result<u32, CompileError> {
    u32::try_from(len).map_err(|_| CompileError::malformed("expression has too many elements", span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argbind_ast::builder::*;

    fn lower(expr: &Expression) -> Vec<String> {
        let mut out = Emitter::new();
        BasicLowering.lower(expr, TextSpan::default(), &mut out).unwrap();
        out.finish().iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(lower(&int(-4)), vec!["push_int -4"]);
        assert_eq!(lower(&sym("a")), vec!["push_symbol :a"]);
        assert_eq!(lower(&Expression::SelfRef), vec!["push_self"]);
    }

    #[test]
    fn test_call_pushes_arguments_before_receiver() {
        let expr = call(Some(lvar("a")), "+", vec![int(1)]);
        assert_eq!(
            lower(&expr),
            vec!["push_int 1", "variable_get a", "push_argc 1", "send :+"]
        );
    }

    #[test]
    fn test_receiverless_call_targets_self() {
        let expr = call(None, "default_name", vec![]);
        assert_eq!(
            lower(&expr),
            vec!["push_self", "push_argc 0", "send :default_name to self"]
        );
    }

    #[test]
    fn test_array_and_hash() {
        let expr = Expression::Hash {
            pairs: vec![(sym("k"), array(vec![nil(), string("s")]))],
        };
        assert_eq!(
            lower(&expr),
            vec![
                "push_symbol :k",
                "push_nil",
                "push_string \"s\"",
                "create_array 2",
                "create_hash 1"
            ]
        );
    }
}
