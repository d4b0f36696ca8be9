//! argbind_ast: Parameter-list and assignment-target nodes.
//!
//! These are the shapes the parser collaborator hands over. They are plain
//! owned trees that deserialize from JSON, so any front end that can emit
//! JSON can drive the compiler. Nothing here is validated; the normalizer
//! in `argbind_binder` decides what is acceptable.

pub mod builder;
pub mod node;
pub mod visitor;

pub use node::*;

/// Parse a compilation unit from its JSON form.
pub fn parse_unit(text: &str) -> Result<CompilationUnit, serde_json::Error> {
    serde_json::from_str(text)
}
