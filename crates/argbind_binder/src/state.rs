//! Per-level binder state.

use crate::working_list::Side;

bitflags::bitflags! {
    /// Keyword-hash bookkeeping for one binding level.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BinderFlags: u8 {
        const NONE                 = 0;
        /// The keyword hash sits on the stack above the incoming sequence.
        const KEYWORD_HASH_STAGED  = 1 << 0;
        /// A keyword rest took the hash; leftover keys are not an error.
        const KEYWORD_REST_SEEN    = 1 << 1;
    }
}

/// State of one binder invocation. Each step takes it by value and returns
/// the next one; a nested destructure starts from [`BinderState::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderState {
    pub side: Side,
    pub flags: BinderFlags,
}

impl BinderState {
    pub fn new() -> Self {
        Self {
            side: Side::Left,
            flags: BinderFlags::NONE,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            side: self.side.flip(),
            ..self
        }
    }

    #[inline]
    pub fn with(self, flag: BinderFlags) -> Self {
        Self {
            flags: self.flags | flag,
            ..self
        }
    }

    #[inline]
    pub fn without(self, flag: BinderFlags) -> Self {
        Self {
            flags: self.flags - flag,
            ..self
        }
    }

    #[inline]
    pub fn keyword_hash_staged(&self) -> bool {
        self.flags.contains(BinderFlags::KEYWORD_HASH_STAGED)
    }

    #[inline]
    pub fn keyword_rest_seen(&self) -> bool {
        self.flags.contains(BinderFlags::KEYWORD_REST_SEEN)
    }
}

impl Default for BinderState {
    fn default() -> Self {
        Self::new()
    }
}
