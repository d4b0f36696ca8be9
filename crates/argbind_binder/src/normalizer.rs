//! Parameter declaration normalizer.
//!
//! Turns raw parameter-list and target-list nodes into arena-allocated spec
//! lists. All branching on node shape happens here: the binders only ever see
//! [`ParameterSpec`] and [`TargetSpec`] values. The normalizer also enforces
//! the ordering rules that keep the two-ended binding well defined:
//!
//! - at most one rest and one keyword rest per level;
//! - no optional parameter after a rest parameter;
//! - no required parameter between two optional parameters;
//! - no positional parameter after a keyword or keyword rest;
//! - no keyword parameter after a keyword rest;
//! - no keyword parameters inside a destructuring group;
//! - no name declared twice anywhere in the list (names starting with `_`
//!   excepted).

use crate::locals::LocalTable;
use crate::spec::{ParameterSpec, TargetSpec, VariableKind};
use crate::working_list::WorkingList;
use argbind_ast::{raw_span, raw_type, Parameter, ParameterList, ParameterNode, Target, TargetList, TargetNode};
use argbind_core::intern::{Name, NameInterner};
use argbind_core::text::TextSpan;
use argbind_core::SpecArena;
use argbind_diagnostics::CompileError;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref LOCAL_NAME: Regex = Regex::new(r"^[a-z_][A-Za-z0-9_]*$").unwrap();
    static ref INSTANCE_NAME: Regex = Regex::new(r"^@[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref GLOBAL_NAME: Regex = Regex::new(r"^\$[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref WRITER_NAME: Regex = Regex::new(r"^[a-z_][A-Za-z0-9_]*=$").unwrap();
}

/// Normalizes the parameters or targets of one body.
pub struct Normalizer<'a> {
    arena: &'a SpecArena,
    interner: &'a NameInterner,
    locals: LocalTable,
}

impl<'a> Normalizer<'a> {
    pub fn new(arena: &'a SpecArena, interner: &'a NameInterner) -> Self {
        Self {
            arena,
            interner,
            locals: LocalTable::new(),
        }
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Normalize a parameter list. An absent list is an empty one.
    pub fn normalize_parameters(
        &mut self,
        list: Option<&'a ParameterList>,
    ) -> Result<WorkingList<'a, ParameterSpec<'a>>, CompileError> {
        let Some(list) = list else {
            return Ok(WorkingList::new(&[]));
        };
        let specs = self.normalize_level(&list.parameters, list.span, false)?;
        debug!(count = specs.len(), "normalized parameter list");
        Ok(WorkingList::new(specs))
    }

    fn normalize_level(
        &mut self,
        nodes: &'a [ParameterNode],
        parent_span: TextSpan,
        in_destructure: bool,
    ) -> Result<&'a [ParameterSpec<'a>], CompileError> {
        let mut order = LevelOrder::default();
        let mut specs = Vec::with_capacity(nodes.len());
        for node in nodes {
            let spec = self.normalize_parameter(node, parent_span, in_destructure)?;
            order.check(&spec)?;
            specs.push(spec);
        }
        Ok(self.arena.alloc_slice(specs))
    }

    fn normalize_parameter(
        &mut self,
        node: &'a ParameterNode,
        parent_span: TextSpan,
        in_destructure: bool,
    ) -> Result<ParameterSpec<'a>, CompileError> {
        match node {
            ParameterNode::Marker(text) => self.normalize_marker(text, parent_span, in_destructure),
            ParameterNode::Node(parameter) => match parameter {
                Parameter::Required { name, span } => Ok(ParameterSpec::Required {
                    name: self.declare(name, *span)?,
                    span: *span,
                }),
                Parameter::Optional { name, value, span } => Ok(ParameterSpec::Optional {
                    name: self.declare(name, *span)?,
                    default: value,
                    span: *span,
                }),
                Parameter::Rest { name, span } => Ok(ParameterSpec::Rest {
                    name: self.declare_optional(name.as_deref(), *span)?,
                    span: *span,
                }),
                Parameter::Keyword { name, value, span } => {
                    if in_destructure {
                        return Err(CompileError::KeywordInsideDestructure {
                            name: name.clone(),
                            span: *span,
                        });
                    }
                    Ok(ParameterSpec::Keyword {
                        name: self.declare(name, *span)?,
                        default: value.as_ref(),
                        span: *span,
                    })
                }
                Parameter::KeywordRest { name, span } => {
                    if in_destructure {
                        return Err(CompileError::KeywordInsideDestructure {
                            name: format!("**{}", name.as_deref().unwrap_or("")),
                            span: *span,
                        });
                    }
                    Ok(ParameterSpec::KeywordRest {
                        name: self.declare_optional(name.as_deref(), *span)?,
                        span: *span,
                    })
                }
                Parameter::Destructure { parameters, span } => {
                    if parameters.is_empty() {
                        return Err(CompileError::malformed("empty destructuring group", *span));
                    }
                    Ok(ParameterSpec::Destructure {
                        children: self.normalize_level(parameters, *span, true)?,
                        span: *span,
                    })
                }
                Parameter::AttributeTarget {
                    receiver,
                    name,
                    span,
                } => Ok(ParameterSpec::PostSplatAttr {
                    receiver,
                    writer: self.writer(name, *span)?,
                    span: *span,
                }),
            },
            ParameterNode::Malformed(raw) => Err(malformed_node("parameter", raw, parent_span)),
        }
    }

    /// Legacy marker strings: `"a"`, `"*a"`, `"*"`, `"**a"`, `"**"`.
    fn normalize_marker(
        &mut self,
        text: &str,
        span: TextSpan,
        in_destructure: bool,
    ) -> Result<ParameterSpec<'a>, CompileError> {
        if let Some(name) = text.strip_prefix("**") {
            if in_destructure {
                return Err(CompileError::KeywordInsideDestructure {
                    name: text.to_string(),
                    span,
                });
            }
            let name = (!name.is_empty()).then_some(name);
            return Ok(ParameterSpec::KeywordRest {
                name: self.declare_optional(name, span)?,
                span,
            });
        }
        if let Some(name) = text.strip_prefix('*') {
            let name = (!name.is_empty()).then_some(name);
            return Ok(ParameterSpec::Rest {
                name: self.declare_optional(name, span)?,
                span,
            });
        }
        Ok(ParameterSpec::Required {
            name: self.declare(text, span)?,
            span,
        })
    }

    fn declare(&mut self, text: &str, span: TextSpan) -> Result<Name, CompileError> {
        if !LOCAL_NAME.is_match(text) {
            return Err(CompileError::malformed(
                format!("`{}` is not a valid parameter name", text),
                span,
            ));
        }
        let name = self.interner.intern(text);
        if text.starts_with('_') {
            // `_` style names may repeat.
            let _ = self.locals.declare(name, span);
            return Ok(name);
        }
        if self.locals.declare(name, span).is_err() {
            return Err(CompileError::DuplicatedArgumentName {
                name: text.to_string(),
                span,
            });
        }
        Ok(name)
    }

    fn declare_optional(
        &mut self,
        text: Option<&str>,
        span: TextSpan,
    ) -> Result<Option<Name>, CompileError> {
        text.map(|text| self.declare(text, span)).transpose()
    }

    fn writer(&self, text: &str, span: TextSpan) -> Result<Name, CompileError> {
        if !WRITER_NAME.is_match(text) {
            return Err(CompileError::malformed(
                format!("`{}` is not an attribute writer", text),
                span,
            ));
        }
        Ok(self.interner.intern(text))
    }

    // ========================================================================
    // Assignment targets
    // ========================================================================

    /// Normalize the left-hand side of a multiple assignment.
    pub fn normalize_targets(
        &mut self,
        list: &'a TargetList,
    ) -> Result<WorkingList<'a, TargetSpec<'a>>, CompileError> {
        let specs = self.normalize_target_level(&list.targets, list.span)?;
        debug!(count = specs.len(), "normalized target list");
        Ok(WorkingList::new(specs))
    }

    fn normalize_target_level(
        &mut self,
        nodes: &'a [TargetNode],
        parent_span: TextSpan,
    ) -> Result<&'a [TargetSpec<'a>], CompileError> {
        let mut splat_seen = false;
        let mut specs = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let TargetNode::Target(Target::Splat { span, .. }) = node {
                if splat_seen {
                    return Err(CompileError::malformed("more than one splat target", *span));
                }
                splat_seen = true;
            }
            specs.push(self.normalize_target(node, parent_span)?);
        }
        Ok(self.arena.alloc_slice(specs))
    }

    fn normalize_target(
        &mut self,
        node: &'a TargetNode,
        parent_span: TextSpan,
    ) -> Result<TargetSpec<'a>, CompileError> {
        let target = match node {
            TargetNode::Target(target) => target,
            TargetNode::Malformed(raw) => {
                return Err(malformed_node("assignment target", raw, parent_span))
            }
        };
        match target {
            Target::LocalVariable { name, span } => {
                self.variable(VariableKind::Local, &LOCAL_NAME, name, *span)
            }
            Target::InstanceVariable { name, span } => {
                self.variable(VariableKind::Instance, &INSTANCE_NAME, name, *span)
            }
            Target::GlobalVariable { name, span } => {
                self.variable(VariableKind::Global, &GLOBAL_NAME, name, *span)
            }
            Target::Nested { targets, span } => {
                if targets.is_empty() {
                    return Err(CompileError::malformed("empty nested target list", *span));
                }
                Ok(TargetSpec::NestedTargets {
                    children: self.normalize_target_level(targets, *span)?,
                    span: *span,
                })
            }
            Target::Splat { target, span } => {
                let target = match target.as_deref() {
                    None => None,
                    Some(
                        inner @ TargetNode::Target(
                            Target::LocalVariable { .. }
                            | Target::InstanceVariable { .. }
                            | Target::GlobalVariable { .. }
                            | Target::Attribute { .. },
                        ),
                    ) => {
                        let spec = self.normalize_target(inner, *span)?;
                        Some(self.arena.alloc(spec))
                    }
                    Some(TargetNode::Malformed(raw)) => {
                        return Err(malformed_node("assignment target", raw, *span))
                    }
                    Some(_) => {
                        return Err(CompileError::malformed(
                            "splat target must be a variable or an attribute",
                            *span,
                        ))
                    }
                };
                Ok(TargetSpec::Rest {
                    target,
                    span: *span,
                })
            }
            Target::Attribute {
                receiver,
                name,
                span,
            } => Ok(TargetSpec::AttributeWrite {
                receiver,
                writer: self.writer(name, *span)?,
                span: *span,
            }),
        }
    }

    fn variable(
        &self,
        kind: VariableKind,
        pattern: &Regex,
        text: &str,
        span: TextSpan,
    ) -> Result<TargetSpec<'a>, CompileError> {
        if !pattern.is_match(text) {
            return Err(CompileError::malformed(
                format!("`{}` is not a valid variable name", text),
                span,
            ));
        }
        Ok(TargetSpec::Variable {
            kind,
            name: self.interner.intern(text),
            span,
        })
    }
}

/// A node that is neither a known tagged node nor a marker string. The error
/// points at the node itself when it carries a span.
fn malformed_node(what: &str, raw: &serde_json::Value, parent_span: TextSpan) -> CompileError {
    let span = raw_span(raw).unwrap_or(parent_span);
    let reason = match raw_type(raw) {
        Some(kind) => format!("unrecognized or incomplete `{}` {} node", kind, what),
        None => format!("unrecognized {} node", what),
    };
    CompileError::malformed(reason, span)
}

/// Ordering rules for the parameters of one level, checked in declaration
/// order.
#[derive(Debug, Default)]
struct LevelOrder {
    rest: bool,
    keyword_rest: bool,
    keyword: bool,
    optional: bool,
    required_after_optional: bool,
}

impl LevelOrder {
    fn check(&mut self, spec: &ParameterSpec<'_>) -> Result<(), CompileError> {
        let span = spec.span();
        if !spec.is_keyword() && (self.keyword || self.keyword_rest) {
            return Err(CompileError::malformed(
                "positional parameter after keyword parameters",
                span,
            ));
        }
        match spec {
            ParameterSpec::Required { .. }
            | ParameterSpec::Destructure { .. }
            | ParameterSpec::PostSplatAttr { .. } => {
                if self.optional && !self.rest {
                    self.required_after_optional = true;
                }
            }
            ParameterSpec::Optional { .. } => {
                if self.rest {
                    return Err(CompileError::malformed(
                        "optional parameter after rest parameter",
                        span,
                    ));
                }
                if self.required_after_optional {
                    return Err(CompileError::malformed(
                        "required parameter between optional parameters",
                        span,
                    ));
                }
                self.optional = true;
            }
            ParameterSpec::Rest { .. } => {
                if self.rest {
                    return Err(CompileError::malformed("more than one rest parameter", span));
                }
                self.rest = true;
            }
            ParameterSpec::Keyword { .. } => {
                if self.keyword_rest {
                    return Err(CompileError::malformed(
                        "keyword parameter after keyword rest parameter",
                        span,
                    ));
                }
                self.keyword = true;
            }
            ParameterSpec::KeywordRest { .. } => {
                if self.keyword_rest {
                    return Err(CompileError::malformed(
                        "more than one keyword rest parameter",
                        span,
                    ));
                }
                self.keyword_rest = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argbind_ast::builder::*;

    fn normalize(list: &ParameterList) -> Result<Vec<String>, CompileError> {
        let arena = SpecArena::new();
        let interner = NameInterner::new();
        let mut normalizer = Normalizer::new(&arena, &interner);
        let specs = normalizer.normalize_parameters(Some(list))?;
        Ok(specs.remaining().iter().map(|s| describe(s, &interner)).collect())
    }

    fn describe(spec: &ParameterSpec<'_>, interner: &NameInterner) -> String {
        let name = |n: Option<Name>| n.map(|n| interner.resolve(n).to_string()).unwrap_or_default();
        match spec {
            ParameterSpec::Required { name: n, .. } => name(Some(*n)),
            ParameterSpec::Optional { name: n, .. } => format!("{}=", name(Some(*n))),
            ParameterSpec::Rest { name: n, .. } => format!("*{}", name(*n)),
            ParameterSpec::Keyword { name: n, .. } => format!("{}:", name(Some(*n))),
            ParameterSpec::KeywordRest { name: n, .. } => format!("**{}", name(*n)),
            ParameterSpec::Destructure { children, .. } => format!(
                "({})",
                children.iter().map(|c| describe(c, interner)).collect::<Vec<_>>().join(", ")
            ),
            ParameterSpec::PostSplatAttr { writer, .. } => format!(".{}", name(Some(*writer))),
        }
    }

    #[test]
    fn test_markers_and_nodes_normalize_alike() {
        let markers = params(vec![marker("a"), marker("*r"), marker("**o")]);
        let nodes = params(vec![req("a"), rest(Some("r")), kwrest(Some("o"))]);
        assert_eq!(normalize(&markers).unwrap(), vec!["a", "*r", "**o"]);
        assert_eq!(normalize(&nodes).unwrap(), normalize(&markers).unwrap());
    }

    #[test]
    fn test_anonymous_markers() {
        let list = params(vec![marker("*"), marker("**")]);
        assert_eq!(normalize(&list).unwrap(), vec!["*", "**"]);
    }

    #[test]
    fn test_absent_list_is_empty() {
        let arena = SpecArena::new();
        let interner = NameInterner::new();
        let mut normalizer = Normalizer::new(&arena, &interner);
        assert!(normalizer.normalize_parameters(None).unwrap().is_empty());
    }

    #[test]
    fn test_nested_destructure() {
        let list = params(vec![req("a"), destructure(vec![req("b"), destructure(vec![marker("*c")])])]);
        assert_eq!(normalize(&list).unwrap(), vec!["a", "(b, (*c))"]);
    }

    #[test]
    fn test_ordering_rules() {
        let cases = vec![
            params(vec![rest(None), rest(Some("b"))]),
            params(vec![rest(Some("a")), opt("b", int(1))]),
            params(vec![opt("a", int(1)), req("b"), opt("c", int(2))]),
            params(vec![kw("a", None), req("b")]),
            params(vec![kwrest(None), kw("a", None)]),
            params(vec![kwrest(None), kwrest(Some("o"))]),
        ];
        for list in cases {
            assert!(
                matches!(normalize(&list), Err(CompileError::MalformedParameter { .. })),
                "{:?} should be rejected",
                list
            );
        }
    }

    #[test]
    fn test_required_after_optionals_and_rest_is_allowed() {
        let list = params(vec![req("a"), opt("b", int(1)), rest(Some("c")), req("d"), kw("e", None)]);
        assert_eq!(normalize(&list).unwrap(), vec!["a", "b=", "*c", "d", "e:"]);
    }

    #[test]
    fn test_bad_names() {
        for bad in ["Const", "1a", "&blk", "a-b", ""] {
            let list = params(vec![marker(bad)]);
            assert!(
                matches!(normalize(&list), Err(CompileError::MalformedParameter { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_duplicate_across_levels() {
        let list = params(vec![req("a"), destructure(vec![req("a")])]);
        assert_eq!(
            normalize(&list),
            Err(CompileError::DuplicatedArgumentName {
                name: "a".into(),
                span: TextSpan::default()
            })
        );
        let underscores = params(vec![req("_"), req("_")]);
        assert!(normalize(&underscores).is_ok());
    }

    #[test]
    fn test_keyword_inside_destructure() {
        let list = params(vec![destructure(vec![req("a"), kw("b", None)])]);
        assert!(matches!(
            normalize(&list),
            Err(CompileError::KeywordInsideDestructure { ref name, .. }) if name == "b"
        ));
        let list = params(vec![destructure(vec![marker("**")])]);
        assert!(matches!(
            normalize(&list),
            Err(CompileError::KeywordInsideDestructure { .. })
        ));
    }

    #[test]
    fn test_unknown_node() {
        let raw = serde_json::json!({ "type": "block", "name": "blk", "span": { "start": 7, "length": 4 } });
        let list = params(vec![req("a"), ParameterNode::Malformed(raw)]);
        assert_eq!(
            normalize(&list),
            Err(CompileError::MalformedParameter {
                reason: "unrecognized or incomplete `block` parameter node".into(),
                span: TextSpan::new(7, 4),
            })
        );
    }

    #[test]
    fn test_malformed_node_without_span_uses_parent() {
        let mut list = params(vec![ParameterNode::Malformed(serde_json::json!(42))]);
        list.span = TextSpan::new(3, 9);
        assert!(matches!(
            normalize(&list),
            Err(CompileError::MalformedParameter { span, .. }) if span == TextSpan::new(3, 9)
        ));
    }

    #[test]
    fn test_malformed_target_points_at_node() {
        let arena = SpecArena::new();
        let interner = NameInterner::new();
        let mut normalizer = Normalizer::new(&arena, &interner);
        let raw = serde_json::json!({ "type": "local_variable", "span": { "start": 12, "length": 1 } });
        let list = targets(vec![local("a"), TargetNode::Malformed(raw)]);
        assert!(matches!(
            normalizer.normalize_targets(&list),
            Err(CompileError::MalformedParameter { span, .. }) if span == TextSpan::new(12, 1)
        ));
    }

    #[test]
    fn test_targets() {
        let arena = SpecArena::new();
        let interner = NameInterner::new();
        let mut normalizer = Normalizer::new(&arena, &interner);

        let list = targets(vec![
            local("a"),
            splat(Some(ivar_target("@rest"))),
            nested(vec![gvar_target("$g"), attr_target(lvar("obj"), "x=")]),
        ]);
        let specs = normalizer.normalize_targets(&list).unwrap();
        assert_eq!(specs.len(), 3);
        assert!(matches!(
            specs.remaining()[1],
            TargetSpec::Rest {
                target: Some(TargetSpec::Variable {
                    kind: VariableKind::Instance,
                    ..
                }),
                ..
            }
        ));

        let two_splats = targets(vec![splat(None), splat(Some(local("b")))]);
        assert!(normalizer.normalize_targets(&two_splats).is_err());

        let nested_splat = targets(vec![splat(Some(nested(vec![local("a")])))]);
        assert!(normalizer.normalize_targets(&nested_splat).is_err());

        let bad_ivar = targets(vec![ivar_target("rest")]);
        assert!(normalizer.normalize_targets(&bad_ivar).is_err());
    }
}
