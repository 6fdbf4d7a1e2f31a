//! Prefetch hooks for [`BoundedCache`](crate::policy::bounded::BoundedCache).
//!
//! Before every `get`, the cache hands its prefetch strategy a [`Loader`]
//! for the requested position. A strategy may pull neighbouring positions
//! into the cache; each load follows the normal miss path (eviction at
//! capacity, fresh recency key) but is counted as a prefetch, not as a hit
//! or a miss.
//!
//! | Strategy      | Behaviour                                            |
//! |---------------|------------------------------------------------------|
//! | `NoPrefetch`  | Does nothing (default)                               |
//! | `ReadAhead`   | On a miss, loads the next `window` positions too     |
//!
//! Custom strategies implement [`Prefetch`]:
//!
//! ```
//! use seqcache::policy::bounded::{BoundedCache, Loader};
//! use seqcache::policy::prefetch::Prefetch;
//! use seqcache::source::ListSource;
//! use seqcache::traits::Source;
//!
//! /// Loads the previous position as well, for callers scrolling upwards.
//! struct ReadBehind;
//!
//! impl<S: Source> Prefetch<S> for ReadBehind {
//!     fn prefetch(&mut self, position: usize, loader: &mut Loader<'_, S>) {
//!         if position > 0 {
//!             loader.load(position - 1);
//!         }
//!     }
//! }
//!
//! let source: ListSource<u32> = (0..10).collect();
//! let mut cache = BoundedCache::with_prefetch(source, 4, ReadBehind);
//! cache.get(5).unwrap();
//! assert!(cache.is_cached(4));
//! assert_eq!(cache.prefetches(), 1);
//! ```

use crate::policy::bounded::Loader;
use crate::traits::Source;

/// Strategy invoked at the start of every `get`.
pub trait Prefetch<S: Source> {
    fn prefetch(&mut self, position: usize, loader: &mut Loader<'_, S>);
}

/// Never prefetches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoPrefetch;

impl<S: Source> Prefetch<S> for NoPrefetch {
    #[inline]
    fn prefetch(&mut self, _position: usize, _loader: &mut Loader<'_, S>) {}
}

/// Sequential read-ahead.
///
/// When the requested position is not cached, also loads up to `window`
/// positions after it. The window is clamped to `capacity - 1` so the
/// read-ahead never evicts its own loads before the requested position is
/// fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadAhead {
    window: usize,
}

impl ReadAhead {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl<S: Source> Prefetch<S> for ReadAhead {
    fn prefetch(&mut self, position: usize, loader: &mut Loader<'_, S>) {
        if loader.is_cached(position) {
            return;
        }
        let window = self.window.min(loader.capacity().saturating_sub(1));
        let end = position
            .saturating_add(window)
            .saturating_add(1)
            .min(loader.len());
        for next in position + 1..end {
            loader.load(next);
        }
    }
}
