//! AST node definitions.

use argbind_core::text::TextSpan;
use serde::{Deserialize, Serialize};

// ============================================================================
// Compilation unit
// ============================================================================

/// One input file: a list of independently compiled bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub bodies: Vec<Body>,
}

/// A method, block, `for` loop or multiple assignment whose binding prologue
/// is compiled as one instruction stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Body {
    Method {
        name: String,
        #[serde(default)]
        parameters: Option<ParameterList>,
        #[serde(default)]
        span: TextSpan,
    },
    Block {
        name: String,
        #[serde(default)]
        parameters: Option<ParameterList>,
        #[serde(default)]
        span: TextSpan,
    },
    /// `for a, b in list`: the loop variables outlive the loop.
    ForLoop {
        name: String,
        #[serde(default)]
        parameters: Option<ParameterList>,
        #[serde(default)]
        span: TextSpan,
    },
    MultipleAssignment {
        name: String,
        targets: TargetList,
        #[serde(default)]
        span: TextSpan,
    },
}

impl Body {
    pub fn name(&self) -> &str {
        match self {
            Body::Method { name, .. }
            | Body::Block { name, .. }
            | Body::ForLoop { name, .. }
            | Body::MultipleAssignment { name, .. } => name,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            Body::Method { span, .. }
            | Body::Block { span, .. }
            | Body::ForLoop { span, .. }
            | Body::MultipleAssignment { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterList {
    #[serde(default)]
    pub parameters: Vec<ParameterNode>,
    #[serde(default)]
    pub span: TextSpan,
}

/// A parameter as produced by either front end.
///
/// Older front ends describe simple parameters as marker strings (`"a"`,
/// `"*rest"`, `"**opts"`, `"*"`, `"**"`); newer ones emit tagged nodes.
/// Anything else is kept as raw JSON so that one bad node only fails the
/// body it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterNode {
    Marker(String),
    Node(Parameter),
    Malformed(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parameter {
    Required {
        name: String,
        #[serde(default)]
        span: TextSpan,
    },
    Optional {
        name: String,
        value: Expression,
        #[serde(default)]
        span: TextSpan,
    },
    Rest {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        span: TextSpan,
    },
    Keyword {
        name: String,
        #[serde(default)]
        value: Option<Expression>,
        #[serde(default)]
        span: TextSpan,
    },
    KeywordRest {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        span: TextSpan,
    },
    Destructure {
        parameters: Vec<ParameterNode>,
        #[serde(default)]
        span: TextSpan,
    },
    /// `for obj.attr in list`: the value is written through `name` (a writer
    /// such as `attr=`) on `receiver`.
    AttributeTarget {
        receiver: Expression,
        name: String,
        #[serde(default)]
        span: TextSpan,
    },
}

// ============================================================================
// Assignment targets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetList {
    #[serde(default)]
    pub targets: Vec<TargetNode>,
    #[serde(default)]
    pub span: TextSpan,
}

/// An assignment target, or the raw JSON of one that did not deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetNode {
    Target(Target),
    Malformed(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    LocalVariable {
        name: String,
        #[serde(default)]
        span: TextSpan,
    },
    InstanceVariable {
        name: String,
        #[serde(default)]
        span: TextSpan,
    },
    GlobalVariable {
        name: String,
        #[serde(default)]
        span: TextSpan,
    },
    Nested {
        targets: Vec<TargetNode>,
        #[serde(default)]
        span: TextSpan,
    },
    Splat {
        #[serde(default)]
        target: Option<Box<TargetNode>>,
        #[serde(default)]
        span: TextSpan,
    },
    Attribute {
        receiver: Expression,
        name: String,
        #[serde(default)]
        span: TextSpan,
    },
}

impl TargetNode {
    pub fn span(&self) -> Option<TextSpan> {
        match self {
            TargetNode::Target(
                Target::LocalVariable { span, .. }
                | Target::InstanceVariable { span, .. }
                | Target::GlobalVariable { span, .. }
                | Target::Nested { span, .. }
                | Target::Splat { span, .. }
                | Target::Attribute { span, .. },
            ) => Some(*span),
            TargetNode::Malformed(raw) => raw_span(raw),
        }
    }
}

// ============================================================================
// Malformed nodes
// ============================================================================

/// The `span` a raw node declares, when it declares a well-formed one.
pub fn raw_span(raw: &serde_json::Value) -> Option<TextSpan> {
    let span = raw.get("span")?;
    TextSpan::deserialize(span).ok()
}

/// The `type` tag of a raw node, if it has one.
pub fn raw_type(raw: &serde_json::Value) -> Option<&str> {
    raw.get("type")?.as_str()
}

// ============================================================================
// Expressions
// ============================================================================

/// Default values and attribute receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    Nil,
    True,
    False,
    #[serde(rename = "self")]
    SelfRef,
    Integer {
        value: i64,
    },
    String {
        value: String,
    },
    Symbol {
        value: String,
    },
    LocalVariable {
        name: String,
    },
    InstanceVariable {
        name: String,
    },
    GlobalVariable {
        name: String,
    },
    Array {
        #[serde(default)]
        elements: Vec<Expression>,
    },
    Hash {
        #[serde(default)]
        pairs: Vec<(Expression, Expression)>,
    },
    Call {
        #[serde(default)]
        receiver: Option<Box<Expression>>,
        method: String,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
}
