//! argbind_core: Core utilities for the argument-binding compiler.
//!
//! Provides name interning, source spans, the spec arena, and the hash
//! collections shared by every stage of the pipeline.

pub mod arena;
pub mod collections;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use arena::SpecArena;
pub use intern::{Name, NameInterner};
pub use text::TextSpan;
