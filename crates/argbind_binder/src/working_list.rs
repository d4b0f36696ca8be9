//! The two-ended list the binders consume.

use std::fmt;

/// The end of the incoming sequence values are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// A shrinking window over an arena slice.
///
/// Items are taken from either end by moving a cursor. The item just taken
/// can be put back on the end it came from; nothing else is ever inserted,
/// so the list never allocates.
#[derive(Debug, Clone, Copy)]
pub struct WorkingList<'a, T> {
    items: &'a [T],
    head: usize,
    tail: usize,
}

impl<'a, T> WorkingList<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items,
            head: 0,
            tail: items.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head >= self.tail
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    /// The items not yet taken, in declaration order.
    #[inline]
    pub fn remaining(&self) -> &'a [T] {
        &self.items[self.head..self.tail]
    }

    pub fn take(&mut self, side: Side) -> Option<&'a T> {
        if self.is_empty() {
            return None;
        }
        match side {
            Side::Left => {
                self.head += 1;
                Some(&self.items[self.head - 1])
            }
            Side::Right => {
                self.tail -= 1;
                Some(&self.items[self.tail])
            }
        }
    }

    /// Undo the last `take(side)`.
    pub fn restore(&mut self, side: Side) {
        match side {
            Side::Left => {
                debug_assert!(self.head > 0);
                self.head -= 1;
            }
            Side::Right => {
                debug_assert!(self.tail < self.items.len());
                self.tail += 1;
            }
        }
    }

    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.remaining().iter().any(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_from_both_ends() {
        let items = [1, 2, 3, 4];
        let mut list = WorkingList::new(&items);
        assert_eq!(list.take(Side::Left), Some(&1));
        assert_eq!(list.take(Side::Right), Some(&4));
        assert_eq!(list.remaining(), &[2, 3]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_restore_puts_item_back_on_its_end() {
        let items = ['a', 'b', 'c'];
        let mut list = WorkingList::new(&items);
        assert_eq!(list.take(Side::Right), Some(&'c'));
        list.restore(Side::Right);
        assert_eq!(list.remaining(), &['a', 'b', 'c']);
        assert_eq!(list.take(Side::Left), Some(&'a'));
        list.restore(Side::Left);
        assert_eq!(list.take(Side::Left), Some(&'a'));
    }

    #[test]
    fn test_exhausted_list() {
        let items = [7];
        let mut list = WorkingList::new(&items);
        assert!(!list.is_empty());
        list.take(Side::Right);
        assert!(list.is_empty());
        assert_eq!(list.take(Side::Left), None);
        assert!(!list.any(|_| true));
    }

    #[test]
    fn test_side_flip() {
        assert_eq!(Side::Left.flip(), Side::Right);
        assert_eq!(Side::Right.flip().flip(), Side::Right);
    }
}
