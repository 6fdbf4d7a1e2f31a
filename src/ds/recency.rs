//! Recency order with O(log n) removal by handle and rank queries.
//!
//! Every [`touch`](RecencyOrder::touch) stamps its value with the next key
//! from a monotonic counter and links it at the newest end of a size-augmented
//! AVL tree. Because keys only grow, in-order position *is* recency rank:
//! rank 0 is the least recently touched value.
//!
//! ## Architecture
//!
//! ```text
//!   oldest                                              newest
//!     │                                                    │
//!     ▼                                                    ▼
//!   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐
//!   │ key 3    │  │ key 7    │  │ key 8    │  │ key 12   │    rank 0..4
//!   │ value e2 │  │ value e0 │  │ value e5 │  │ value e1 │
//!   └──────────┘  └──────────┘  └──────────┘  └──────────┘
//!
//!   touch(e9)     -> key 13 appended after key 12
//!   release(h)    -> node unlinked, later ranks shift down
//!   bump recency  =  release(h) then touch(value)   (never re-keyed in place)
//! ```
//!
//! A [`RecencyHandle`] pairs the node id with the key it was issued for, so a
//! released handle never aliases a later node that reuses the arena slot.
//!
//! ## Operations
//!
//! | Operation    | Description                          | Complexity |
//! |--------------|--------------------------------------|------------|
//! | `touch`      | Append with a fresh key              | O(log n)   |
//! | `release`    | Remove by handle                     | O(log n)   |
//! | `oldest`     | Handle with the smallest key         | O(log n)   |
//! | `pop_oldest` | Remove and return the oldest         | O(log n)   |
//! | `nth`        | Handle at a recency rank             | O(log n)   |
//! | `rank_of`    | Recency rank of a handle             | O(log n)   |
//!
//! ## Example Usage
//!
//! ```
//! use seqcache::ds::RecencyOrder;
//!
//! let mut order = RecencyOrder::new();
//! let a = order.touch("a");
//! let b = order.touch("b");
//! assert_eq!(order.oldest(), Some(a));
//!
//! // Promote "a": release and touch again.
//! let value = order.release(a).unwrap();
//! let a = order.touch(value);
//! assert_eq!(order.oldest(), Some(b));
//! assert_eq!(order.rank_of(a), Some(1));
//! ```

use crate::ds::order_tree::{NodeId, OrderTree};
use crate::error::InvariantError;

/// Identifies one touch of one value. Never valid again after release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecencyHandle {
    node: NodeId,
    key: u64,
}

impl RecencyHandle {
    /// The recency key issued with this handle.
    pub fn key(self) -> u64 {
        self.key
    }
}

#[derive(Debug, Clone)]
struct Stamped<T> {
    key: u64,
    value: T,
}

/// Values ordered by when they were last touched.
#[derive(Debug, Clone)]
pub struct RecencyOrder<T> {
    tree: OrderTree<Stamped<T>>,
    next_key: u64,
}

impl<T> RecencyOrder<T> {
    pub fn new() -> Self {
        Self {
            tree: OrderTree::new(),
            next_key: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: OrderTree::with_capacity(capacity),
            next_key: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key the next `touch` will issue.
    pub fn next_key(&self) -> u64 {
        self.next_key
    }

    /// Drops every value. Keys keep increasing, so old handles stay dead.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Links `value` as the most recently used entry.
    ///
    /// # Panics
    ///
    /// Panics if the key counter would overflow.
    pub fn touch(&mut self, value: T) -> RecencyHandle {
        let key = self.next_key;
        self.next_key = match key.checked_add(1) {
            Some(next) => next,
            None => panic!("recency key space exhausted"),
        };
        let len = self.tree.len();
        let node = self.tree.insert_at(len, 1, Some(Stamped { key, value }));
        RecencyHandle { node, key }
    }

    /// Unlinks the entry behind `handle` and returns its value.
    ///
    /// Returns `None` if the handle was already released.
    pub fn release(&mut self, handle: RecencyHandle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let (_, stamped) = self.tree.remove_node(handle.node);
        stamped.map(|stamped| stamped.value)
    }

    pub fn contains(&self, handle: RecencyHandle) -> bool {
        self.stamped(handle).is_some()
    }

    pub fn get(&self, handle: RecencyHandle) -> Option<&T> {
        self.stamped(handle).map(|stamped| &stamped.value)
    }

    /// Least recently touched entry.
    pub fn oldest(&self) -> Option<RecencyHandle> {
        self.tree.first().map(|node| self.handle(node))
    }

    /// Most recently touched entry.
    pub fn newest(&self) -> Option<RecencyHandle> {
        self.tree.last().map(|node| self.handle(node))
    }

    /// Removes the least recently touched entry.
    pub fn pop_oldest(&mut self) -> Option<(RecencyHandle, T)> {
        let handle = self.oldest()?;
        let value = self.release(handle)?;
        Some((handle, value))
    }

    /// Entry at recency rank `rank` (0 = oldest).
    pub fn nth(&self, rank: usize) -> Option<RecencyHandle> {
        let (node, _) = self.tree.locate(rank)?;
        Some(self.handle(node))
    }

    /// Recency rank of `handle` (0 = oldest).
    pub fn rank_of(&self, handle: RecencyHandle) -> Option<usize> {
        self.contains(handle)
            .then(|| self.tree.position_of(handle.node))
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (RecencyHandle, &T)> + '_ {
        let mut current = self.tree.first();
        std::iter::from_fn(move || {
            let node = current?;
            current = self.tree.next(node);
            let stamped = self.tree.payload(node)?;
            Some((
                RecencyHandle {
                    node,
                    key: stamped.key,
                },
                &stamped.value,
            ))
        })
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.tree.approx_bytes()
    }

    /// Validates the tree and that keys strictly increase with rank.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.tree.check_invariants()?;
        if self.tree.empties() != 0 {
            return Err(InvariantError::new("recency order holds an empty node"));
        }
        let mut previous: Option<u64> = None;
        for (handle, _) in self.iter() {
            if previous.is_some_and(|prev| prev >= handle.key) {
                return Err(InvariantError::new(format!(
                    "recency key {} not greater than its predecessor",
                    handle.key
                )));
            }
            if handle.key >= self.next_key {
                return Err(InvariantError::new(format!(
                    "recency key {} was never issued",
                    handle.key
                )));
            }
            previous = Some(handle.key);
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates internal invariants (debug/test builds only).
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("recency order invariant violated: {}", err);
        }
    }

    fn stamped(&self, handle: RecencyHandle) -> Option<&Stamped<T>> {
        self.tree
            .payload(handle.node)
            .filter(|stamped| stamped.key == handle.key)
    }

    fn handle(&self, node: NodeId) -> RecencyHandle {
        match self.tree.payload(node) {
            Some(stamped) => RecencyHandle {
                node,
                key: stamped.key,
            },
            None => panic!("recency order: node {} has no entry", node.index()),
        }
    }
}

impl<T> Default for RecencyOrder<T> {
    fn default() -> Self {
        Self::new()
    }
}
