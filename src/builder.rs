//! Builder for bounded sequence caches.
//!
//! Collects capacity and prefetch strategy, validates them once, and hands
//! back a [`BoundedCache`] (or, with the `concurrency` feature, a
//! [`ConcurrentBoundedCache`](crate::policy::bounded::ConcurrentBoundedCache)).
//!
//! ## Example
//!
//! ```rust
//! use seqcache::builder::BoundedCacheBuilder;
//! use seqcache::policy::prefetch::ReadAhead;
//! use seqcache::source::ListSource;
//!
//! let source: ListSource<u64> = (0..1_000).collect();
//! let mut cache = BoundedCacheBuilder::new(64)
//!     .prefetch(ReadAhead::new(8))
//!     .build(source);
//!
//! assert_eq!(*cache.get(10).unwrap(), 10);
//! assert!(cache.is_cached(18));
//! assert_eq!(cache.prefetches(), 8);
//! ```

#[cfg(feature = "concurrency")]
use crate::policy::bounded::ConcurrentBoundedCache;
use crate::error::ConfigError;
use crate::policy::bounded::BoundedCache;
use crate::policy::prefetch::{NoPrefetch, Prefetch};
use crate::traits::Source;

/// Builder for creating [`BoundedCache`] instances.
#[derive(Debug, Clone)]
pub struct BoundedCacheBuilder<P = NoPrefetch> {
    capacity: usize,
    prefetch: P,
}

impl BoundedCacheBuilder {
    /// Create a new builder with the specified capacity and no prefetch.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            prefetch: NoPrefetch,
        }
    }
}

impl<P> BoundedCacheBuilder<P> {
    /// Replace the prefetch strategy.
    pub fn prefetch<Q>(self, prefetch: Q) -> BoundedCacheBuilder<Q> {
        BoundedCacheBuilder {
            capacity: self.capacity,
            prefetch,
        }
    }

    /// Override the capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Build a cache over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity is zero.
    pub fn try_build<S>(self, source: S) -> Result<BoundedCache<S, P>, ConfigError>
    where
        S: Source,
        P: Prefetch<S>,
    {
        BoundedCache::try_with_prefetch(source, self.capacity, self.prefetch)
    }

    /// Build a cache over `source`.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero.
    pub fn build<S>(self, source: S) -> BoundedCache<S, P>
    where
        S: Source,
        P: Prefetch<S>,
    {
        BoundedCache::with_prefetch(source, self.capacity, self.prefetch)
    }

    /// Build a lock-wrapped cache that can be shared across threads.
    #[cfg(feature = "concurrency")]
    pub fn try_build_concurrent<S>(
        self,
        source: S,
    ) -> Result<ConcurrentBoundedCache<S, P>, ConfigError>
    where
        S: Source,
        P: Prefetch<S>,
    {
        self.try_build(source).map(ConcurrentBoundedCache::from_cache)
    }
}
