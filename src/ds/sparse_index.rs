//! Positional index of mostly-empty slots.
//!
//! A `SparseIndex<T>` is a sequence of slots addressed by position, where each
//! slot is either empty or holds a `T`. Consecutive empty slots collapse into
//! a single counted run, so memory and operation cost follow the number of
//! filled slots (plus the runs between them), not the sequence length.
//!
//! ## Architecture
//!
//! ```text
//!   logical:   0    1    2    3    4    5    6    7    8    9
//!             [ ]  [ ]  [ ]  [a]  [ ]  [ ]  [b]  [ ]  [ ]  [ ]
//!
//!   nodes:    ┌──────────┐  ┌───┐  ┌──────┐  ┌───┐  ┌──────────┐
//!             │ run × 3  │  │ a │  │ run×2│  │ b │  │ run × 3  │
//!             └──────────┘  └───┘  └──────┘  └───┘  └──────────┘
//!                5 nodes for 10 positions; insert(1, None) just bumps
//!                the first run to 4.
//! ```
//!
//! Filled slots get a [`NodeId`] that stays valid while positions shift
//! around it, and [`position_of`](SparseIndex::position_of) maps it back to
//! the slot's current position in O(log n).
//!
//! ## Operations
//!
//! | Operation      | Description                                 | Complexity |
//! |----------------|---------------------------------------------|------------|
//! | `insert`       | Insert a slot, shifting later ones up       | O(log n)   |
//! | `remove`       | Remove a slot, shifting later ones down     | O(log n)   |
//! | `set`          | Replace a slot's payload in place           | O(log n)   |
//! | `get`          | Payload at a position                       | O(log n)   |
//! | `node_at`      | Stable handle of a filled slot              | O(log n)   |
//! | `position_of`  | Current position of a handle                | O(log n)   |
//! | `iter`         | Every slot in order (`None` for empties)    | O(len)     |
//! | `iter_filled`  | Filled slots with their positions           | O(nodes)   |
//!
//! No two empty runs are ever adjacent; every operation merges runs that
//! would otherwise touch.
//!
//! ## Example Usage
//!
//! ```
//! use seqcache::ds::SparseIndex;
//!
//! let mut index = SparseIndex::new();
//! for _ in 0..1_000 {
//!     index.insert(0, None);
//! }
//! assert_eq!(index.node_count(), 1);
//!
//! index.set(500, Some("hot"));
//! let node = index.node_at(500).unwrap();
//! index.remove(0);
//! assert_eq!(index.position_of(node), 499);
//! assert_eq!(index.get(499), Some(&"hot"));
//! assert_eq!(index.node_count(), 3);
//! ```
//!
//! ## Thread Safety
//!
//! `SparseIndex` is not thread-safe. Wrap in a mutex for concurrent access.

use crate::ds::order_tree::{NodeId, OrderTree};
use crate::error::{CacheError, InvariantError};

/// Position-addressed slots with run-length compressed empties.
#[derive(Debug, Clone)]
pub struct SparseIndex<T> {
    tree: OrderTree<T>,
}

impl<T> SparseIndex<T> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            tree: OrderTree::new(),
        }
    }

    /// Creates an empty index with room for `nodes` tree nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            tree: OrderTree::with_capacity(nodes),
        }
    }

    /// Creates an index of `len` empty slots held by a single node.
    ///
    /// ```
    /// use seqcache::ds::SparseIndex;
    ///
    /// let index: SparseIndex<u8> = SparseIndex::with_empty(42);
    /// assert_eq!(index.len(), 42);
    /// assert_eq!(index.node_count(), 1);
    /// ```
    pub fn with_empty(len: usize) -> Self {
        let mut index = Self::new();
        index.reset(len);
        index
    }

    /// Number of slots, empty or not.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots holding a payload.
    pub fn filled_len(&self) -> usize {
        self.tree.len() - self.tree.empties()
    }

    /// Number of empty slots.
    pub fn empty_len(&self) -> usize {
        self.tree.empties()
    }

    /// Number of materialized tree nodes (filled slots plus empty runs).
    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    /// Removes every slot.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Drops every payload and leaves exactly `len` empty slots.
    pub fn reset(&mut self, len: usize) {
        self.tree.clear();
        if len > 0 {
            self.tree.insert_at(0, len, None);
        }
    }

    /// Inserts a slot at `position`, shifting later slots up by one.
    ///
    /// Returns the handle of the new slot when `payload` is `Some`. An empty
    /// slot next to (or inside) an existing run only grows that run.
    ///
    /// # Panics
    ///
    /// Panics if `position > len()`.
    pub fn insert(&mut self, position: usize, payload: Option<T>) -> Option<NodeId> {
        let len = self.len();
        assert!(
            position <= len,
            "insert position {} out of bounds (len {})",
            position,
            len
        );
        match payload {
            None => {
                self.insert_empty(position);
                None
            },
            Some(value) => {
                self.split_at(position);
                Some(self.tree.insert_at(position, 1, Some(value)))
            },
        }
    }

    /// Removes the slot at `position`, shifting later slots down by one.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    pub fn remove(&mut self, position: usize) -> Option<T> {
        let (id, _) = self.locate_or_panic(position);
        if self.tree.is_run(id) {
            let span = self.tree.span(id);
            if span > 1 {
                self.tree.set_run_span(id, span - 1);
                return None;
            }
        }
        let prev = self.tree.prev(id);
        let (_, payload) = self.tree.remove_node(id);
        if let Some(prev) = prev {
            self.coalesce(prev);
        }
        payload
    }

    /// Replaces the payload at `position` and returns the previous one.
    ///
    /// Nothing shifts. Filling a slot inside an empty run splits the run;
    /// emptying a filled slot merges it with neighbouring runs, which
    /// retires that slot's [`NodeId`].
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`.
    pub fn set(&mut self, position: usize, payload: Option<T>) -> Option<T> {
        let (id, _) = self.locate_or_panic(position);
        match (self.tree.is_run(id), payload) {
            (false, Some(value)) => self
                .tree
                .payload_mut(id)
                .map(|slot| std::mem::replace(slot, value)),
            (false, None) => {
                let previous = self.tree.set_payload(id, None);
                self.coalesce(id);
                previous
            },
            (true, None) => None,
            (true, Some(value)) => {
                self.split_at(position);
                self.split_at(position + 1);
                let (single, _) = self.locate_or_panic(position);
                debug_assert_eq!(self.tree.span(single), 1);
                self.tree.set_payload(single, Some(value))
            },
        }
    }

    /// Payload at `position`, `None` for an empty slot.
    ///
    /// # Panics
    ///
    /// Panics if `position >= len()`, like slice indexing.
    pub fn get(&self, position: usize) -> Option<&T> {
        let (id, _) = self.locate_or_panic(position);
        self.tree.payload(id)
    }

    /// Checked variant of [`get`](Self::get).
    pub fn try_get(&self, position: usize) -> Result<Option<&T>, CacheError> {
        match self.tree.locate(position) {
            Some((id, _)) => Ok(self.tree.payload(id)),
            None => Err(CacheError::OutOfRange {
                position,
                len: self.len(),
            }),
        }
    }

    /// Mutable payload at `position`.
    pub fn get_mut(&mut self, position: usize) -> Option<&mut T> {
        let (id, _) = self.locate_or_panic(position);
        self.tree.payload_mut(id)
    }

    /// Stable handle of the filled slot at `position`.
    ///
    /// `None` for empty slots and out-of-range positions.
    pub fn node_at(&self, position: usize) -> Option<NodeId> {
        let (id, _) = self.tree.locate(position)?;
        (!self.tree.is_run(id)).then_some(id)
    }

    /// Current position of a filled slot.
    ///
    /// # Panics
    ///
    /// Panics if `node` no longer belongs to this index.
    pub fn position_of(&self, node: NodeId) -> usize {
        self.tree.position_of(node)
    }

    /// Payload behind a handle, if the handle is still live and filled.
    pub fn value(&self, node: NodeId) -> Option<&T> {
        self.tree.payload(node)
    }

    /// Returns `true` if `node` is a live filled slot of this index.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.tree.contains(node) && !self.tree.is_run(node)
    }

    /// Iterates every slot in position order; empty slots yield `None`.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: &self.tree,
            node: self.tree.first(),
            offset: 0,
            remaining: self.len(),
        }
    }

    /// Iterates `(position, &payload)` over filled slots only.
    pub fn iter_filled(&self) -> FilledIter<'_, T> {
        FilledIter {
            tree: &self.tree,
            node: self.tree.first(),
            position: 0,
        }
    }

    /// Position-by-position cursor that can remove the slot it just yielded.
    pub fn cursor(&mut self) -> Cursor<'_, T> {
        Cursor {
            index: self,
            next: 0,
            current: None,
        }
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.tree.approx_bytes()
    }

    /// Validates tree structure and run compression.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.tree.check_invariants()?;
        let mut previous_was_run = false;
        let mut current = self.tree.first();
        while let Some(id) = current {
            let is_run = self.tree.is_run(id);
            if is_run && previous_was_run {
                return Err(InvariantError::new(format!(
                    "adjacent empty runs around position {}",
                    self.tree.position_of(id)
                )));
            }
            previous_was_run = is_run;
            current = self.tree.next(id);
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates internal invariants (debug/test builds only).
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("sparse index invariant violated: {}", err);
        }
    }

    #[track_caller]
    fn locate_or_panic(&self, position: usize) -> (NodeId, usize) {
        match self.tree.locate(position) {
            Some(found) => found,
            None => panic!(
                "position {} out of bounds (len {})",
                position,
                self.len()
            ),
        }
    }

    fn insert_empty(&mut self, position: usize) {
        if let Some((id, _)) = self.tree.locate(position) {
            if self.tree.is_run(id) {
                self.grow_run(id, 1);
                return;
            }
        }
        if position > 0 {
            if let Some((id, _)) = self.tree.locate(position - 1) {
                if self.tree.is_run(id) {
                    self.grow_run(id, 1);
                    return;
                }
            }
        }
        self.tree.insert_at(position, 1, None);
    }

    fn grow_run(&mut self, id: NodeId, by: usize) {
        let span = self.tree.span(id);
        self.tree.set_run_span(id, span + by);
    }

    /// Makes `position` a node boundary by splitting the run that straddles it.
    fn split_at(&mut self, position: usize) {
        if let Some((id, offset)) = self.tree.locate(position) {
            if offset > 0 {
                let span = self.tree.span(id);
                self.tree.set_run_span(id, offset);
                self.tree.insert_at(position, span - offset, None);
            }
        }
    }

    /// Folds empty neighbours of the run at `id` into it.
    fn coalesce(&mut self, id: NodeId) {
        if !self.tree.is_run(id) {
            return;
        }
        let mut id = id;
        if let Some(prev) = self.tree.prev(id) {
            if self.tree.is_run(prev) {
                let (span, _) = self.tree.remove_node(id);
                self.grow_run(prev, span);
                id = prev;
            }
        }
        if let Some(next) = self.tree.next(id) {
            if self.tree.is_run(next) {
                let (span, _) = self.tree.remove_node(next);
                self.grow_run(id, span);
            }
        }
    }
}

impl<T> Default for SparseIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<Option<T>> for SparseIndex<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        let mut index = Self::new();
        for payload in iter {
            let len = index.len();
            index.insert(len, payload);
        }
        index
    }
}

impl<'a, T> IntoIterator for &'a SparseIndex<T> {
    type Item = Option<&'a T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over every slot of a [`SparseIndex`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    tree: &'a OrderTree<T>,
    node: Option<NodeId>,
    offset: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = Option<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.node?;
        self.remaining -= 1;
        if let Some(payload) = self.tree.payload(id) {
            self.node = self.tree.next(id);
            return Some(Some(payload));
        }
        self.offset += 1;
        if self.offset == self.tree.span(id) {
            self.offset = 0;
            self.node = self.tree.next(id);
        }
        Some(None)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> std::iter::FusedIterator for Iter<'_, T> {}

/// Iterator over the filled slots of a [`SparseIndex`].
#[derive(Debug)]
pub struct FilledIter<'a, T> {
    tree: &'a OrderTree<T>,
    node: Option<NodeId>,
    position: usize,
}

impl<'a, T> Iterator for FilledIter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.node?;
            let position = self.position;
            self.position += self.tree.span(id);
            self.node = self.tree.next(id);
            if let Some(payload) = self.tree.payload(id) {
                return Some((position, payload));
            }
        }
    }
}

/// One-shot cursor over a [`SparseIndex`] supporting removal while walking.
///
/// ```
/// use seqcache::ds::SparseIndex;
///
/// let mut index: SparseIndex<u32> = [Some(1), None, Some(2), Some(3)].into_iter().collect();
/// let mut cursor = index.cursor();
/// while let Some(slot) = cursor.advance() {
///     if slot == Some(&2) {
///         cursor.remove_current();
///     }
/// }
/// let left: Vec<_> = index.iter().map(|slot| slot.copied()).collect();
/// assert_eq!(left, vec![Some(1), None, Some(3)]);
/// ```
#[derive(Debug)]
pub struct Cursor<'a, T> {
    index: &'a mut SparseIndex<T>,
    next: usize,
    current: Option<usize>,
}

impl<T> Cursor<'_, T> {
    /// Moves to the next slot and returns its payload (`None` when empty).
    ///
    /// Returns `None` once the end is reached.
    #[allow(clippy::option_option)]
    pub fn advance(&mut self) -> Option<Option<&T>> {
        if self.next >= self.index.len() {
            self.current = None;
            return None;
        }
        let position = self.next;
        self.next += 1;
        self.current = Some(position);
        Some(self.index.get(position))
    }

    /// Position of the slot last returned by [`advance`](Self::advance).
    pub fn position(&self) -> Option<usize> {
        self.current
    }

    /// Removes the slot last returned by [`advance`](Self::advance); the
    /// next call to `advance` yields the slot that followed it.
    ///
    /// # Panics
    ///
    /// Panics if there is no current slot (before the first `advance`, after
    /// the end, or twice for the same slot).
    pub fn remove_current(&mut self) -> Option<T> {
        let Some(position) = self.current.take() else {
            panic!("cursor has no current slot to remove");
        };
        self.next = position;
        self.index.remove(position)
    }
}
