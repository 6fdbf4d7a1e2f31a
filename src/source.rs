//! Change records and a `Vec`-backed observable source.
//!
//! [`ListSource`] is the reference [`Source`]: every edit is applied to the
//! backing `Vec` and recorded as a [`Change`], and
//! [`take_changes`](ObservableSource::take_changes) hands the pending batch
//! to whoever replays it. It also counts fetches, which makes cache
//! effectiveness directly observable in tests and benches.
//!
//! ```
//! use seqcache::source::{Change, ListSource};
//! use seqcache::traits::ObservableSource;
//!
//! let mut list = ListSource::from(vec!['a', 'b', 'c']);
//! list.remove(0);
//! list.insert(2, 'z');
//! list.set(0, 'B');
//! assert_eq!(list.as_slice(), &['B', 'c', 'z']);
//! assert_eq!(
//!     list.take_changes(),
//!     vec![Change::delete(0), Change::insert(2), Change::update(0)]
//! );
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::{ObservableSource, Source};

/// What happened at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A new element now occupies the position; later ones shifted up.
    Insert,
    /// The element at the position is gone; later ones shifted down.
    Delete,
    /// The element at the position was replaced in place.
    Update,
}

/// One edit of a source sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Change {
    pub kind: ChangeKind,
    pub position: usize,
}

impl Change {
    pub const fn new(kind: ChangeKind, position: usize) -> Self {
        Self { kind, position }
    }

    pub const fn insert(position: usize) -> Self {
        Self::new(ChangeKind::Insert, position)
    }

    pub const fn delete(position: usize) -> Self {
        Self::new(ChangeKind::Delete, position)
    }

    pub const fn update(position: usize) -> Self {
        Self::new(ChangeKind::Update, position)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChangeKind::Insert => "insert",
            ChangeKind::Delete => "delete",
            ChangeKind::Update => "update",
        };
        write!(f, "{} at {}", kind, self.position)
    }
}

/// Observable `Vec` source.
#[derive(Debug, Default)]
pub struct ListSource<T> {
    items: Vec<T>,
    pending: Vec<Change>,
    fetches: AtomicU64,
}

impl<T> ListSource<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            pending: Vec::new(),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of `get` calls served so far.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn reset_fetches(&self) {
        self.fetches.store(0, Ordering::Relaxed);
    }

    /// Changes recorded but not yet taken.
    pub fn pending_changes(&self) -> &[Change] {
        &self.pending
    }

    pub fn push(&mut self, value: T) {
        self.pending.push(Change::insert(self.items.len()));
        self.items.push(value);
    }

    /// # Panics
    ///
    /// Panics if `position > len()`.
    pub fn insert(&mut self, position: usize, value: T) {
        self.items.insert(position, value);
        self.pending.push(Change::insert(position));
    }

    /// # Panics
    ///
    /// Panics if `position >= len()`.
    pub fn remove(&mut self, position: usize) -> T {
        let value = self.items.remove(position);
        self.pending.push(Change::delete(position));
        value
    }

    /// Replaces the element at `position` and returns the old one.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    pub fn set(&mut self, position: usize, value: T) -> T {
        let previous = std::mem::replace(&mut self.items[position], value);
        self.pending.push(Change::update(position));
        previous
    }

    /// Removes trailing elements, one `Delete` per element.
    pub fn truncate(&mut self, len: usize) {
        while self.items.len() > len {
            let position = self.items.len() - 1;
            self.remove(position);
        }
    }

    /// Removes every element, recording deletes at position 0.
    pub fn clear(&mut self) {
        let len = self.items.len();
        self.items.clear();
        self.pending
            .extend(std::iter::repeat(Change::delete(0)).take(len));
    }

    /// Keeps elements matching `keep`, deleting the rest front to back.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let mut position = 0;
        while position < self.items.len() {
            if keep(&self.items[position]) {
                position += 1;
            } else {
                self.remove(position);
            }
        }
    }
}

impl<T: Clone> Source for ListSource<T> {
    type Value = T;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, position: usize) -> T {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.items[position].clone()
    }
}

impl<T: Clone> ObservableSource for ListSource<T> {
    fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.pending)
    }
}

/// Wraps existing elements without recording changes for them.
impl<T> From<Vec<T>> for ListSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            pending: Vec::new(),
            fetches: AtomicU64::new(0),
        }
    }
}

impl<T> FromIterator<T> for ListSource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_are_recorded_in_order() {
        let mut list: ListSource<u32> = (0..5).collect();
        assert!(list.pending_changes().is_empty());
        list.push(5);
        list.set(2, 20);
        assert_eq!(list.remove(0), 0);
        assert_eq!(
            list.take_changes(),
            vec![Change::insert(5), Change::update(2), Change::delete(0)]
        );
        assert!(list.take_changes().is_empty());
        assert_eq!(list.as_slice(), &[1, 20, 3, 4, 5]);
    }

    #[test]
    fn clear_and_truncate_emit_progressive_deletes() {
        let mut list: ListSource<u8> = vec![1, 2, 3, 4].into();
        list.truncate(2);
        assert_eq!(list.take_changes(), vec![Change::delete(3), Change::delete(2)]);
        list.clear();
        assert_eq!(list.take_changes(), vec![Change::delete(0); 2]);
        assert!(list.is_empty());
    }

    #[test]
    fn retain_deletes_at_shifting_positions() {
        let mut list: ListSource<u8> = vec![1, 2, 3, 4, 6].into();
        list.retain(|v| v % 2 == 1);
        assert_eq!(list.as_slice(), &[1, 3]);
        assert_eq!(
            list.take_changes(),
            vec![Change::delete(1), Change::delete(2), Change::delete(2)]
        );
    }

    #[test]
    fn get_counts_fetches() {
        let list: ListSource<&str> = vec!["a", "b"].into();
        assert_eq!(list.get(1), "b");
        assert_eq!(list.get(1), "b");
        assert_eq!(list.fetches(), 2);
        list.reset_fetches();
        assert_eq!(list.fetches(), 0);
    }

    #[test]
    fn change_display() {
        assert_eq!(Change::insert(3).to_string(), "insert at 3");
        assert_eq!(Change::update(0).to_string(), "update at 0");
    }
}
