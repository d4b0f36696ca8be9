//! Hash collections used throughout the compiler.
//!
//! FxHash is used everywhere: keys are interned names and short strings
//! produced by the compiler itself, so DoS resistance is not needed.

pub use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use std::hash::{Hash, Hasher};

/// Hash any value with FxHash. Used for cache fingerprints, which must be
/// stable for identical input within one build of the compiler.
pub fn fx_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_hash_is_deterministic() {
        assert_eq!(fx_hash("def foo(a, *b)"), fx_hash("def foo(a, *b)"));
        assert_ne!(fx_hash("a"), fx_hash("b"));
    }
}
