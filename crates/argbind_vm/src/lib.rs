//! argbind_vm: A small stack machine for binding instruction streams.
//!
//! Runs what the binder emits against real argument values so a compiled
//! parameter list can be checked end to end. Values are reference counted
//! and single threaded; a [`Machine`] is cheap to create per call.

pub mod error;
pub mod machine;
mod send;
pub mod value;

pub use error::RuntimeError;
pub use machine::{Machine, Scope};
pub use value::{HashKey, Object, Value};
