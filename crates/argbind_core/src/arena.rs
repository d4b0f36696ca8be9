//! Arena allocation for normalized spec trees.
//!
//! The normalizer allocates every spec slice (the top-level list and each
//! destructure group) in a bump arena owned by one compilation shard. The
//! binders then walk those slices with cursors and never allocate. Dropping
//! the arena frees the whole tree at once.

use bumpalo::Bump;

/// Bump arena holding the spec trees of one compilation shard.
pub struct SpecArena {
    bump: Bump,
}

impl SpecArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Move the elements of `items` into the arena and return them as a slice.
    ///
    /// Values placed in the arena are never dropped, so `T` should not own
    /// heap data (spec nodes only hold references and interned names).
    #[inline]
    pub fn alloc_slice<T>(&self, items: Vec<T>) -> &[T] {
        self.bump.alloc_slice_fill_iter(items)
    }

    #[inline]
    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    /// Returns the total bytes allocated in this arena.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Reset the arena, deallocating all specs but keeping the memory.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl Default for SpecArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_slice_keeps_order() {
        let arena = SpecArena::new();
        let slice = arena.alloc_slice(vec![3u32, 1, 2]);
        assert_eq!(slice, &[3, 1, 2]);
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn test_alloc_empty_slice() {
        let arena = SpecArena::new();
        let slice: &[u8] = arena.alloc_slice(Vec::new());
        assert!(slice.is_empty());
    }
}
