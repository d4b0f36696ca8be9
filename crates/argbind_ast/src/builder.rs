//! Node construction helpers.
//!
//! Front ends normally hand over JSON; these helpers build the same trees in
//! Rust for tests, benchmarks and embedders. Spans are left at their default.

use crate::node::*;
use argbind_core::text::TextSpan;

// -- Parameters --

pub fn params(parameters: Vec<ParameterNode>) -> ParameterList {
    ParameterList {
        parameters,
        span: TextSpan::default(),
    }
}

/// A legacy marker-string parameter such as `"a"`, `"*rest"` or `"**"`.
pub fn marker(text: &str) -> ParameterNode {
    ParameterNode::Marker(text.to_string())
}

pub fn req(name: &str) -> ParameterNode {
    ParameterNode::Node(Parameter::Required {
        name: name.to_string(),
        span: TextSpan::default(),
    })
}

pub fn opt(name: &str, value: Expression) -> ParameterNode {
    ParameterNode::Node(Parameter::Optional {
        name: name.to_string(),
        value,
        span: TextSpan::default(),
    })
}

pub fn rest(name: Option<&str>) -> ParameterNode {
    ParameterNode::Node(Parameter::Rest {
        name: name.map(str::to_string),
        span: TextSpan::default(),
    })
}

pub fn kw(name: &str, value: Option<Expression>) -> ParameterNode {
    ParameterNode::Node(Parameter::Keyword {
        name: name.to_string(),
        value,
        span: TextSpan::default(),
    })
}

pub fn kwrest(name: Option<&str>) -> ParameterNode {
    ParameterNode::Node(Parameter::KeywordRest {
        name: name.map(str::to_string),
        span: TextSpan::default(),
    })
}

pub fn destructure(parameters: Vec<ParameterNode>) -> ParameterNode {
    ParameterNode::Node(Parameter::Destructure {
        parameters,
        span: TextSpan::default(),
    })
}

pub fn attr_param(receiver: Expression, writer: &str) -> ParameterNode {
    ParameterNode::Node(Parameter::AttributeTarget {
        receiver,
        name: writer.to_string(),
        span: TextSpan::default(),
    })
}

// -- Targets --

pub fn targets(targets: Vec<TargetNode>) -> TargetList {
    TargetList {
        targets,
        span: TextSpan::default(),
    }
}

pub fn local(name: &str) -> TargetNode {
    TargetNode::Target(Target::LocalVariable {
        name: name.to_string(),
        span: TextSpan::default(),
    })
}

pub fn ivar_target(name: &str) -> TargetNode {
    TargetNode::Target(Target::InstanceVariable {
        name: name.to_string(),
        span: TextSpan::default(),
    })
}

pub fn gvar_target(name: &str) -> TargetNode {
    TargetNode::Target(Target::GlobalVariable {
        name: name.to_string(),
        span: TextSpan::default(),
    })
}

pub fn nested(targets: Vec<TargetNode>) -> TargetNode {
    TargetNode::Target(Target::Nested {
        targets,
        span: TextSpan::default(),
    })
}

pub fn splat(target: Option<TargetNode>) -> TargetNode {
    TargetNode::Target(Target::Splat {
        target: target.map(Box::new),
        span: TextSpan::default(),
    })
}

pub fn attr_target(receiver: Expression, writer: &str) -> TargetNode {
    TargetNode::Target(Target::Attribute {
        receiver,
        name: writer.to_string(),
        span: TextSpan::default(),
    })
}

// -- Expressions --

pub fn nil() -> Expression {
    Expression::Nil
}

pub fn int(value: i64) -> Expression {
    Expression::Integer { value }
}

pub fn string(value: &str) -> Expression {
    Expression::String {
        value: value.to_string(),
    }
}

pub fn sym(value: &str) -> Expression {
    Expression::Symbol {
        value: value.to_string(),
    }
}

pub fn lvar(name: &str) -> Expression {
    Expression::LocalVariable {
        name: name.to_string(),
    }
}

pub fn ivar(name: &str) -> Expression {
    Expression::InstanceVariable {
        name: name.to_string(),
    }
}

pub fn array(elements: Vec<Expression>) -> Expression {
    Expression::Array { elements }
}

pub fn call(receiver: Option<Expression>, method: &str, arguments: Vec<Expression>) -> Expression {
    Expression::Call {
        receiver: receiver.map(Box::new),
        method: method.to_string(),
        arguments,
    }
}
