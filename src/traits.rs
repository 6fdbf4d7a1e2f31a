//! # Source Traits
//!
//! The cache sits in front of a *source*: a positionally-addressed sequence
//! whose reads are expensive and whose edits arrive as ordered batches of
//! [`Change`] records.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌─────────────────────────────────────┐
//!                  │            Source                   │
//!                  │                                     │
//!                  │  len(&self) → usize                 │
//!                  │  get(&self, position) → Value       │   ◄── may be slow
//!                  └──────────────────┬──────────────────┘
//!                                     │
//!                                     ▼
//!                  ┌─────────────────────────────────────┐
//!                  │        ObservableSource             │
//!                  │                                     │
//!                  │  take_changes(&mut self)            │
//!                  │        → Vec<Change>                │   ◄── one batch
//!                  └─────────────────────────────────────┘
//! ```
//!
//! ## Change Batch Semantics
//!
//! Positions inside one batch are relative to the sequence *as modified by
//! the earlier records of the same batch*:
//!
//! ```text
//!   before:  [a, b, c, d]
//!   batch:   delete at 1, delete at 1, insert at 0
//!
//!   delete 1 → [a, c, d]
//!   delete 1 → [a, d]
//!   insert 0 → [x, a, d]
//! ```
//!
//! so a batch must be replayed strictly in order, one record at a time.
//!
//! ## Implementations
//!
//! | Type                   | Notes                                       |
//! |------------------------|---------------------------------------------|
//! | `ListSource<T>`        | `Vec`-backed, records its own edits         |
//! | `&S`, `Box<S>`, `Arc<S>` | Forward to the inner source              |
//!
//! A source shared behind `&S` or `Arc<S>` is edited elsewhere; its owner
//! hands each batch to [`BoundedCache::replay`](crate::policy::bounded::BoundedCache::replay).

use std::sync::Arc;

use crate::source::Change;

/// A positionally-addressed sequence the cache reads through.
pub trait Source {
    /// Value produced for a position.
    type Value;

    /// Current number of positions.
    fn len(&self) -> usize;

    /// Returns `true` if the sequence holds no positions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produces the value at `position`. Only called with `position < len()`.
    fn get(&self, position: usize) -> Self::Value;
}

/// A source that records its own edits as change batches.
pub trait ObservableSource: Source {
    /// Drains the changes recorded since the previous call, oldest first.
    fn take_changes(&mut self) -> Vec<Change>;
}

impl<S: Source + ?Sized> Source for &S {
    type Value = S::Value;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, position: usize) -> Self::Value {
        (**self).get(position)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    type Value = S::Value;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, position: usize) -> Self::Value {
        (**self).get(position)
    }
}

impl<S: ObservableSource + ?Sized> ObservableSource for Box<S> {
    fn take_changes(&mut self) -> Vec<Change> {
        (**self).take_changes()
    }
}

impl<S: Source + ?Sized> Source for Arc<S> {
    type Value = S::Value;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, position: usize) -> Self::Value {
        (**self).get(position)
    }
}
