//! Names declared by one parameter list.

use argbind_core::intern::Name;
use argbind_core::text::TextSpan;
use rustc_hash::FxHashMap;

/// Every name a parameter list binds, across all destructuring levels.
///
/// Nested groups bind into the same method scope as the outer list, so a
/// single flat table is enough to find duplicates.
#[derive(Debug, Clone, Default)]
pub struct LocalTable {
    table: FxHashMap<Name, TextSpan>,
    /// Declaration order, for callers that list the locals.
    order: Vec<Name>,
}

impl LocalTable {
    pub fn new() -> Self {
        Self {
            table: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Record `name`. Returns the span of the earlier declaration when the
    /// name is already taken.
    pub fn declare(&mut self, name: Name, span: TextSpan) -> Result<(), TextSpan> {
        if let Some(previous) = self.table.get(&name) {
            return Err(*previous);
        }
        self.table.insert(name, span);
        self.order.push(name);
        Ok(())
    }

    pub fn get(&self, name: Name) -> Option<TextSpan> {
        self.table.get(&name).copied()
    }

    pub fn has(&self, name: Name) -> bool {
        self.table.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Name> + '_ {
        self.order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argbind_core::intern::NameInterner;

    #[test]
    fn test_duplicate_reports_first_span() {
        let interner = NameInterner::new();
        let a = interner.intern("a");
        let mut locals = LocalTable::new();
        assert!(locals.declare(a, TextSpan::new(1, 1)).is_ok());
        assert_eq!(locals.declare(a, TextSpan::new(9, 1)), Err(TextSpan::new(1, 1)));
        assert_eq!(locals.len(), 1);
        assert!(locals.has(a));
    }

    #[test]
    fn test_iter_keeps_declaration_order() {
        let interner = NameInterner::new();
        let names: Vec<Name> = ["z", "b", "m"].iter().map(|s| interner.intern(s)).collect();
        let mut locals = LocalTable::new();
        for name in &names {
            locals.declare(*name, TextSpan::default()).unwrap();
        }
        assert_eq!(locals.iter().collect::<Vec<_>>(), names);
    }
}
