//! Expression traversal.
//!
//! Provides a `for_each_child` function for generic iteration over the
//! sub-expressions of an expression, and a few queries built on it.

use crate::node::Expression;

/// Call `f` on each direct sub-expression of `expr`, in evaluation order.
pub fn for_each_child<'e>(expr: &'e Expression, f: &mut impl FnMut(&'e Expression)) {
    match expr {
        Expression::Array { elements } => elements.iter().for_each(f),
        Expression::Hash { pairs } => {
            for (key, value) in pairs {
                f(key);
                f(value);
            }
        }
        Expression::Call {
            receiver,
            arguments,
            ..
        } => {
            arguments.iter().for_each(&mut *f);
            if let Some(receiver) = receiver {
                f(receiver);
            }
        }
        Expression::Nil
        | Expression::True
        | Expression::False
        | Expression::SelfRef
        | Expression::Integer { .. }
        | Expression::String { .. }
        | Expression::Symbol { .. }
        | Expression::LocalVariable { .. }
        | Expression::InstanceVariable { .. }
        | Expression::GlobalVariable { .. } => {}
    }
}

/// Whether `expr` reads the local variable `name` anywhere in its tree.
pub fn reads_local(expr: &Expression, name: &str) -> bool {
    if let Expression::LocalVariable { name: read } = expr {
        return read == name;
    }
    let mut found = false;
    for_each_child(expr, &mut |child| {
        found = found || reads_local(child, name);
    });
    found
}
