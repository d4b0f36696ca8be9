//! Normalized parameter and assignment-target descriptions.
//!
//! Specs live in a [`SpecArena`](argbind_core::SpecArena) and borrow their
//! default and receiver expressions from the AST, so both trees share the
//! lifetime `'a` of one compilation.

use argbind_ast::Expression;
use argbind_core::intern::Name;
use argbind_core::text::TextSpan;

/// One declared parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSpec<'a> {
    Required {
        name: Name,
        span: TextSpan,
    },
    Optional {
        name: Name,
        default: &'a Expression,
        span: TextSpan,
    },
    /// `*name`, or `*` when `name` is `None`.
    Rest {
        name: Option<Name>,
        span: TextSpan,
    },
    Keyword {
        name: Name,
        default: Option<&'a Expression>,
        span: TextSpan,
    },
    /// `**name`, or `**` when `name` is `None`.
    KeywordRest {
        name: Option<Name>,
        span: TextSpan,
    },
    Destructure {
        children: &'a [ParameterSpec<'a>],
        span: TextSpan,
    },
    /// An attribute write used as an iteration target (`for obj.x in list`).
    PostSplatAttr {
        receiver: &'a Expression,
        writer: Name,
        span: TextSpan,
    },
}

impl<'a> ParameterSpec<'a> {
    pub fn span(&self) -> TextSpan {
        match self {
            ParameterSpec::Required { span, .. }
            | ParameterSpec::Optional { span, .. }
            | ParameterSpec::Rest { span, .. }
            | ParameterSpec::Keyword { span, .. }
            | ParameterSpec::KeywordRest { span, .. }
            | ParameterSpec::Destructure { span, .. }
            | ParameterSpec::PostSplatAttr { span, .. } => *span,
        }
    }

    /// Specs that must receive a positional value. An optional parameter may
    /// only take a value once none of these remain.
    #[inline]
    pub fn is_required_positional(&self) -> bool {
        matches!(
            self,
            ParameterSpec::Required { .. }
                | ParameterSpec::Destructure { .. }
                | ParameterSpec::PostSplatAttr { .. }
        )
    }

    #[inline]
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            ParameterSpec::Keyword { .. } | ParameterSpec::KeywordRest { .. }
        )
    }
}

/// Where an assigned variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Local,
    Instance,
    Global,
}

/// One multiple-assignment target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSpec<'a> {
    Variable {
        kind: VariableKind,
        name: Name,
        span: TextSpan,
    },
    NestedTargets {
        children: &'a [TargetSpec<'a>],
        span: TextSpan,
    },
    /// `*target`, or a bare `*`. The target is a `Variable` or an
    /// `AttributeWrite`.
    Rest {
        target: Option<&'a TargetSpec<'a>>,
        span: TextSpan,
    },
    AttributeWrite {
        receiver: &'a Expression,
        writer: Name,
        span: TextSpan,
    },
}

impl<'a> TargetSpec<'a> {
    pub fn span(&self) -> TextSpan {
        match self {
            TargetSpec::Variable { span, .. }
            | TargetSpec::NestedTargets { span, .. }
            | TargetSpec::Rest { span, .. }
            | TargetSpec::AttributeWrite { span, .. } => *span,
        }
    }
}
