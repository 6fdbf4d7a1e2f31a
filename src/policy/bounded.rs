//! # Bounded Recency Cache over a Mutable Sequence
//!
//! `BoundedCache` sits in front of a [`Source`] whose reads are expensive and
//! keeps at most `capacity` fetched values, evicting the least recently used
//! one when full. Edits to the source arrive as ordered change batches and
//! are replayed against the cache so cached values shift with their
//! positions, and deleted or updated positions are dropped.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                        BoundedCache<S, P>                                │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  SparseIndex<SlotId>      one slot per source position             │ │
//!   │   │                                                                    │ │
//!   │   │   [ run×4 ][ e2 ][ run×9 ][ e0 ][ e1 ][ run×120 ]                   │ │
//!   │   └──────────────┬────────────────┬─────┬──────────────────────────────┘ │
//!   │                  │ entry id       │     │                                │
//!   │   ┌──────────────▼────────────────▼─────▼──────────────────────────────┐ │
//!   │   │  SlotArena<Entry<V>>                                               │ │
//!   │   │    Entry { value: Arc<V>, slot: NodeId, recency: RecencyHandle }   │ │
//!   │   └──────────────┬────────────────┬─────┬──────────────────────────────┘ │
//!   │                  │ handle         │     │                                │
//!   │   ┌──────────────▼────────────────▼─────▼──────────────────────────────┐ │
//!   │   │  RecencyOrder<SlotId>                                              │ │
//!   │   │   oldest ─► [e0 k=3] [e2 k=8] [e1 k=11] ◄─ newest                  │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                                                          │
//!   │   source: S          capacity          hits / misses / prefetches        │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every link is a stable integer handle: an entry finds its current position
//! through its slot's [`NodeId`] in O(log n), and finds its recency node
//! through its [`RecencyHandle`], no matter how far inserts and deletes
//! elsewhere have shifted it.
//!
//! ## Read Path
//!
//! ```text
//!   get(p)
//!     │  p >= len ───────────────────────────► Err(OutOfRange)
//!     ▼
//!   prefetch hook (may load neighbours)
//!     ▼
//!   index.get(p) ── Some(entry) ──► hits += 1
//!     │                             release + touch (fresh key)
//!     │                             return Arc<V>
//!     None
//!     ▼
//!   misses += 1
//!   at capacity? ── yes ──► pop oldest, empty its slot
//!     ▼
//!   source.get(p), new entry, index.set(p), recency.touch
//! ```
//!
//! ## Mutation Replay
//!
//! | Record      | Effect                                                    |
//! |-------------|-----------------------------------------------------------|
//! | `Insert p`  | new empty slot at `p`, later slots shift up               |
//! | `Delete p`  | drop entry at `p` (if any), remove slot, shift down        |
//! | `Update p`  | drop entry at `p` (if any), slot stays, now empty          |
//!
//! Records are applied one at a time, in order. A record that does not fit
//! the index at that point of the batch, or a batch whose net effect
//! disagrees with `source.len()`, makes the cache drop everything and
//! resynchronize to the source length before reporting the error.
//!
//! ## Failure Semantics
//!
//! - Out-of-range reads and misused batches are `Err(CacheError)`.
//! - A broken cross-link between index, entries and recency order is a bug
//!   and panics instead of returning a value the cache cannot vouch for.
//! - The source changing length without a replayed batch is detected on the
//!   next read, which resynchronizes like a misused batch and returns
//!   `Err(CacheError::LengthMismatch)`.
//!
//! ## Thread Safety
//!
//! `get` reorders recency and may evict, so it is a write. `BoundedCache` is
//! `Send` when its parts are; [`ConcurrentBoundedCache`] (feature
//! `concurrency`) puts it behind one `parking_lot::Mutex` so reads, replays
//! and statistics all serialize on the same lock.
//!
//! ## Example Usage
//!
//! ```
//! use seqcache::policy::bounded::BoundedCache;
//! use seqcache::source::ListSource;
//!
//! let source = ListSource::from(vec!["a", "b", "c"]);
//! let mut cache = BoundedCache::new(source, 2);
//!
//! assert_eq!(*cache.get(0).unwrap(), "a"); // miss
//! assert_eq!(*cache.get(1).unwrap(), "b"); // miss
//! assert_eq!(*cache.get(0).unwrap(), "a"); // hit
//! assert_eq!(*cache.get(2).unwrap(), "c"); // miss, evicts position 1
//! assert!(!cache.is_cached(1));
//!
//! // Edit the source through the cache; the change batch is replayed.
//! cache.mutate(|list| list.insert(0, "z")).unwrap();
//! assert_eq!(cache.len(), 4);
//! assert!(cache.is_cached(1)); // "a" shifted from 0 to 1
//! assert_eq!(*cache.get(1).unwrap(), "a");
//! ```

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::ds::{NodeId, RecencyHandle, RecencyOrder, SlotArena, SlotId, SparseIndex};
use crate::error::{CacheError, ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::BoundedCacheMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::BoundedCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsSnapshotProvider, PrefetchMetricsRecorder, ReplayMetricsRecorder,
};
use crate::policy::prefetch::{NoPrefetch, Prefetch};
use crate::source::{Change, ChangeKind};
use crate::traits::{ObservableSource, Source};

/// Upper bound on up-front allocation; larger capacities grow on demand.
const PREALLOC_LIMIT: usize = 4096;

#[derive(Debug)]
struct Entry<V> {
    value: Arc<V>,
    slot: NodeId,
    recency: RecencyHandle,
}

/// Everything except the prefetch strategy, so the strategy can borrow it.
struct CacheCore<S: Source> {
    source: S,
    index: SparseIndex<SlotId>,
    recency: RecencyOrder<SlotId>,
    entries: SlotArena<Entry<S::Value>>,
    capacity: usize,
    hits: u64,
    misses: u64,
    prefetches: u64,
    last_known_len: usize,
    #[cfg(feature = "metrics")]
    metrics: BoundedCacheMetrics,
}

impl<S: Source> CacheCore<S> {
    fn new(source: S, capacity: usize) -> Self {
        let len = source.len();
        let prealloc = capacity.min(PREALLOC_LIMIT);
        Self {
            source,
            index: SparseIndex::with_empty(len),
            recency: RecencyOrder::with_capacity(prealloc),
            entries: SlotArena::with_capacity(prealloc),
            capacity,
            hits: 0,
            misses: 0,
            prefetches: 0,
            last_known_len: len,
            #[cfg(feature = "metrics")]
            metrics: BoundedCacheMetrics::new(),
        }
    }

    /// Resynchronizes and reports if the source changed length behind the
    /// cache's back.
    fn ensure_synced(&mut self) -> Result<(), CacheError> {
        let expected = self.source.len();
        if expected != self.last_known_len {
            let indexed = self.last_known_len;
            return Err(self.resync(CacheError::LengthMismatch { indexed, expected }));
        }
        Ok(())
    }

    fn cached_entry(&self, position: usize) -> Option<SlotId> {
        if position >= self.index.len() {
            return None;
        }
        self.index.get(position).copied()
    }

    fn fetch(&mut self, position: usize) -> Arc<S::Value> {
        if let Some(entry_id) = self.cached_entry(position) {
            self.hits += 1;
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();
            self.promote(entry_id);
            return Arc::clone(&self.entries[entry_id].value);
        }

        self.misses += 1;
        #[cfg(feature = "metrics")]
        self.metrics.record_get_miss();
        self.load(position)
    }

    /// Moves an entry to the newest end with a fresh key.
    fn promote(&mut self, entry_id: SlotId) {
        let handle = self.entries[entry_id].recency;
        self.release_recency(entry_id, handle);
        self.entries[entry_id].recency = self.recency.touch(entry_id);
    }

    /// Fetches `position` from the source and caches it, evicting first if
    /// the cache is full. The slot must be empty.
    fn load(&mut self, position: usize) -> Arc<S::Value> {
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let value = Arc::new(self.source.get(position));
        let entry_id = self.entries.vacant_id();
        if let Some(previous) = self.index.set(position, Some(entry_id)) {
            panic!(
                "loading position {} over cached entry {}",
                position,
                previous.index()
            );
        }
        let Some(slot) = self.index.node_at(position) else {
            unreachable!("slot {} empty right after it was filled", position)
        };
        let recency = self.recency.touch(entry_id);
        let inserted = self.entries.insert(Entry {
            value: Arc::clone(&value),
            slot,
            recency,
        });
        debug_assert_eq!(inserted, entry_id);
        self.debug_check_counts();
        value
    }

    fn evict_oldest(&mut self) {
        let Some((handle, entry_id)) = self.recency.pop_oldest() else {
            panic!(
                "cache holds {} entries but its recency order is empty",
                self.entries.len()
            );
        };
        let Some(entry) = self.entries.remove(entry_id) else {
            panic!(
                "recency order references missing cache entry {}",
                entry_id.index()
            );
        };
        assert_eq!(
            entry.recency,
            handle,
            "cache entry {} is linked to a different recency node",
            entry_id.index()
        );

        let position = self.index.position_of(entry.slot);
        match self.index.set(position, None) {
            Some(owner) if owner == entry_id => {},
            other => panic!(
                "slot at {} held {:?} instead of evicted entry {}",
                position,
                other,
                entry_id.index()
            ),
        }
        trace!(position, key = handle.key(), "evicted least recently used entry");
        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();
    }

    /// Drops the entry cached at `position` without touching the slot.
    fn invalidate_at(&mut self, position: usize) -> bool {
        let Some(entry_id) = self.cached_entry(position) else {
            return false;
        };
        let Some(entry) = self.entries.remove(entry_id) else {
            panic!(
                "slot at {} references missing cache entry {}",
                position,
                entry_id.index()
            );
        };
        self.release_recency(entry_id, entry.recency);
        #[cfg(feature = "metrics")]
        self.metrics.record_invalidated_entry();
        true
    }

    fn release_recency(&mut self, entry_id: SlotId, handle: RecencyHandle) {
        match self.recency.release(handle) {
            Some(owner) if owner == entry_id => {},
            other => panic!(
                "cache entry {} lost its recency node (found {:?})",
                entry_id.index(),
                other
            ),
        }
    }

    fn replay(&mut self, batch: &[Change]) -> Result<(), CacheError> {
        #[cfg(feature = "metrics")]
        self.metrics.record_batch();

        for &change in batch {
            let len = self.index.len();
            let position = change.position;
            match change.kind {
                ChangeKind::Insert if position <= len => {
                    self.index.insert(position, None);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_replayed_insert();
                },
                ChangeKind::Delete if position < len => {
                    self.invalidate_at(position);
                    self.index.remove(position);
                    #[cfg(feature = "metrics")]
                    self.metrics.record_replayed_delete();
                },
                ChangeKind::Update if position < len => {
                    if self.invalidate_at(position) {
                        self.index.set(position, None);
                    }
                    #[cfg(feature = "metrics")]
                    self.metrics.record_replayed_update();
                },
                _ => return Err(self.resync(CacheError::InvalidChange { change, len })),
            }
            trace!(%change, "replayed change");
        }

        let expected = self.source.len();
        let indexed = self.index.len();
        if indexed != expected {
            return Err(self.resync(CacheError::LengthMismatch { indexed, expected }));
        }
        self.last_known_len = expected;
        self.debug_check_counts();
        debug!(
            records = batch.len(),
            len = expected,
            cached = self.entries.len(),
            "replayed change batch"
        );
        Ok(())
    }

    /// Drops every entry and rebuilds the index to the source's length.
    fn resync(&mut self, err: CacheError) -> CacheError {
        let len = self.source.len();
        warn!(
            error = %err,
            len,
            dropped = self.entries.len(),
            "change batch rejected, resynchronizing cache"
        );
        self.entries.clear();
        self.recency.clear();
        self.index.reset(len);
        self.last_known_len = len;
        #[cfg(feature = "metrics")]
        self.metrics.record_resync();
        err
    }

    fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        let len = self.index.len();
        self.index.reset(len);
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
        debug!(dropped, "cleared cache");
    }

    fn debug_check_counts(&self) {
        debug_assert!(self.entries.len() <= self.capacity);
        debug_assert_eq!(self.entries.len(), self.recency.len());
        debug_assert_eq!(self.entries.len(), self.index.filled_len());
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.index.check_invariants()?;
        self.recency.check_invariants()?;

        let cached = self.entries.len();
        if cached > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                cached, self.capacity
            )));
        }
        if self.recency.len() != cached {
            return Err(InvariantError::new(format!(
                "{} entries but {} recency nodes",
                cached,
                self.recency.len()
            )));
        }
        if self.index.filled_len() != cached {
            return Err(InvariantError::new(format!(
                "{} entries but {} filled slots",
                cached,
                self.index.filled_len()
            )));
        }
        if self.index.len() != self.last_known_len {
            return Err(InvariantError::new(format!(
                "index holds {} slots, last known source length is {}",
                self.index.len(),
                self.last_known_len
            )));
        }
        for (entry_id, entry) in self.entries.iter() {
            if self.index.value(entry.slot) != Some(&entry_id) {
                return Err(InvariantError::new(format!(
                    "entry {} not referenced by its slot",
                    entry_id.index()
                )));
            }
            if self.recency.get(entry.recency) != Some(&entry_id) {
                return Err(InvariantError::new(format!(
                    "entry {} not referenced by its recency node",
                    entry_id.index()
                )));
            }
        }
        Ok(())
    }
}

/// Handle given to a [`Prefetch`] strategy for loading extra positions.
pub struct Loader<'a, S: Source> {
    core: &'a mut CacheCore<S>,
}

impl<S: Source> Loader<'_, S> {
    /// Length of the sequence.
    pub fn len(&self) -> usize {
        self.core.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.core.capacity
    }

    pub fn cached_len(&self) -> usize {
        self.core.entries.len()
    }

    pub fn is_cached(&self, position: usize) -> bool {
        self.core.cached_entry(position).is_some()
    }

    /// Caches `position` if it is in range and not cached yet.
    ///
    /// Returns `true` if the source was read. Already-cached positions are
    /// left where they are in recency order.
    pub fn load(&mut self, position: usize) -> bool {
        if position >= self.len() || self.is_cached(position) {
            return false;
        }
        self.core.load(position);
        self.core.prefetches += 1;
        #[cfg(feature = "metrics")]
        self.core.metrics.record_prefetch_load();
        true
    }
}

/// Point-in-time counters of a [`BoundedCache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub prefetches: u64,
    pub cached: usize,
    pub capacity: usize,
    pub len: usize,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or 0.0 before the first access.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of source values, kept aligned with the source under edits.
pub struct BoundedCache<S: Source, P = NoPrefetch> {
    core: CacheCore<S>,
    prefetch: P,
}

impl<S: Source> BoundedCache<S> {
    /// Creates a cache holding at most `capacity` values of `source`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for
    /// user-supplied capacities.
    pub fn new(source: S, capacity: usize) -> Self {
        Self::with_prefetch(source, capacity, NoPrefetch)
    }

    /// Fallible variant of [`new`](Self::new).
    pub fn try_new(source: S, capacity: usize) -> Result<Self, ConfigError> {
        Self::try_with_prefetch(source, capacity, NoPrefetch)
    }
}

impl<S: Source, P: Prefetch<S>> BoundedCache<S, P> {
    /// Creates a cache with a prefetch strategy.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_prefetch(source: S, capacity: usize, prefetch: P) -> Self {
        match Self::try_with_prefetch(source, capacity, prefetch) {
            Ok(cache) => cache,
            Err(err) => panic!("{}", err),
        }
    }

    /// Fallible variant of [`with_prefetch`](Self::with_prefetch).
    pub fn try_with_prefetch(source: S, capacity: usize, prefetch: P) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("capacity must be greater than zero"));
        }
        Ok(Self {
            core: CacheCore::new(source, capacity),
            prefetch,
        })
    }

    /// Returns the value at `position`, from cache when possible.
    ///
    /// # Errors
    ///
    /// [`CacheError::OutOfRange`] if `position >= len()`.
    /// [`CacheError::LengthMismatch`] if the source changed length without
    /// its change batch being replayed; the cache is left empty and aligned
    /// with the new length, so the next `get` succeeds.
    ///
    /// # Panics
    ///
    /// Panics if the cache's internal links are corrupt.
    pub fn get(&mut self, position: usize) -> Result<Arc<S::Value>, CacheError> {
        self.core.ensure_synced()?;
        let len = self.core.source.len();
        if position >= len {
            return Err(CacheError::OutOfRange { position, len });
        }
        self.prefetch.prefetch(
            position,
            &mut Loader {
                core: &mut self.core,
            },
        );
        Ok(self.core.fetch(position))
    }

    /// Replays one ordered batch of source changes.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidChange`] or [`CacheError::LengthMismatch`] when
    /// the batch does not describe the source's edit. The cache is left
    /// empty and aligned with the source's current length.
    pub fn replay(&mut self, batch: &[Change]) -> Result<(), CacheError> {
        self.core.replay(batch)
    }

    /// Edits the owned source and replays the changes it recorded.
    ///
    /// ```
    /// use seqcache::policy::bounded::BoundedCache;
    /// use seqcache::source::ListSource;
    ///
    /// let mut cache = BoundedCache::new(ListSource::from(vec![10, 20, 30]), 8);
    /// cache.get(2).unwrap();
    /// let removed = cache.mutate(|list| list.remove(0)).unwrap();
    /// assert_eq!(removed, 10);
    /// assert!(cache.is_cached(1));
    /// ```
    pub fn mutate<R>(&mut self, edit: impl FnOnce(&mut S) -> R) -> Result<R, CacheError>
    where
        S: ObservableSource,
    {
        // Edits recorded before the source was handed over are already
        // reflected in the index.
        let stale = self.core.source.take_changes();
        if !stale.is_empty() {
            debug!(records = stale.len(), "discarding changes recorded before caching");
        }
        let out = edit(&mut self.core.source);
        let changes = self.core.source.take_changes();
        self.core.replay(&changes)?;
        Ok(out)
    }

    /// Drops the cached value at `position`, if any. The next `get` misses.
    pub fn invalidate(&mut self, position: usize) -> Result<bool, CacheError> {
        let len = self.core.index.len();
        if position >= len {
            return Err(CacheError::OutOfRange { position, len });
        }
        let dropped = self.core.invalidate_at(position);
        if dropped {
            self.core.index.set(position, None);
        }
        Ok(dropped)
    }

    /// Drops every cached value. Statistics are kept.
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Returns the cached value at `position` without promoting it or
    /// touching statistics.
    pub fn peek(&self, position: usize) -> Option<Arc<S::Value>> {
        self.core
            .cached_entry(position)
            .map(|entry_id| Arc::clone(&self.core.entries[entry_id].value))
    }

    pub fn is_cached(&self, position: usize) -> bool {
        self.core.cached_entry(position).is_some()
    }

    /// Recency rank of the value cached at `position`; 0 is evicted next.
    pub fn recency_rank(&self, position: usize) -> Option<usize> {
        let entry_id = self.core.cached_entry(position)?;
        self.core.recency.rank_of(self.core.entries[entry_id].recency)
    }

    /// Length of the source sequence.
    pub fn len(&self) -> usize {
        self.core.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.core.capacity
    }

    /// Number of values currently cached.
    pub fn cached_len(&self) -> usize {
        self.core.entries.len()
    }

    pub fn hits(&self) -> u64 {
        self.core.hits
    }

    pub fn misses(&self) -> u64 {
        self.core.misses
    }

    /// Positions loaded by the prefetch strategy.
    pub fn prefetches(&self) -> u64 {
        self.core.prefetches
    }

    /// `hits / (hits + misses)`, or 0.0 before the first access.
    pub fn hit_ratio(&self) -> f64 {
        self.stats().hit_ratio()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.core.hits,
            misses: self.core.misses,
            prefetches: self.core.prefetches,
            cached: self.core.entries.len(),
            capacity: self.core.capacity,
            len: self.core.index.len(),
        }
    }

    pub fn reset_stats(&mut self) {
        self.core.hits = 0;
        self.core.misses = 0;
        self.core.prefetches = 0;
        #[cfg(feature = "metrics")]
        self.core.metrics.reset();
    }

    pub fn source(&self) -> &S {
        &self.core.source
    }

    pub fn prefetch_policy(&self) -> &P {
        &self.prefetch
    }

    pub fn prefetch_policy_mut(&mut self) -> &mut P {
        &mut self.prefetch
    }

    /// Nodes materialized by the positional index.
    pub fn index_nodes(&self) -> usize {
        self.core.index.node_count()
    }

    /// Returns an approximate memory footprint in bytes, excluding values.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.core.index.approx_bytes()
            + self.core.recency.approx_bytes()
            + self.core.entries.approx_bytes()
    }

    /// Walks index, entries and recency order checking every cross-link.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.core.check_invariants()
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates internal invariants (debug/test builds only).
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("bounded cache invariant violated: {}", err);
        }
    }
}

#[cfg(feature = "metrics")]
impl<S: Source, P: Prefetch<S>> BoundedCache<S, P> {
    pub fn metrics_snapshot(&self) -> BoundedCacheMetricsSnapshot {
        let metrics = &self.core.metrics;
        BoundedCacheMetricsSnapshot {
            get_calls: metrics.get_calls,
            get_hits: metrics.get_hits,
            get_misses: metrics.get_misses,
            evicted_entries: metrics.evicted_entries,
            clears: metrics.clears,
            prefetch_loads: metrics.prefetch_loads,
            batches: metrics.batches,
            replayed_inserts: metrics.replayed_inserts,
            replayed_deletes: metrics.replayed_deletes,
            replayed_updates: metrics.replayed_updates,
            invalidated_entries: metrics.invalidated_entries,
            resyncs: metrics.resyncs,
            cached_entries: self.core.entries.len(),
            capacity: self.core.capacity,
            sequence_len: self.core.index.len(),
            index_nodes: self.core.index.node_count(),
        }
    }
}

#[cfg(feature = "metrics")]
impl<S: Source, P: Prefetch<S>> MetricsSnapshotProvider<BoundedCacheMetricsSnapshot>
    for BoundedCache<S, P>
{
    fn snapshot(&self) -> BoundedCacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<S: Source, P> fmt::Debug for BoundedCache<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.core.index.len())
            .field("cached", &self.core.entries.len())
            .field("capacity", &self.core.capacity)
            .field("hits", &self.core.hits)
            .field("misses", &self.core.misses)
            .finish_non_exhaustive()
    }
}

/// Thread-safe [`BoundedCache`] behind a single exclusive lock.
///
/// Every operation, including `get` and the statistics reads, takes the same
/// `parking_lot::Mutex`, so no caller ever sees a half-replayed batch.
#[cfg(feature = "concurrency")]
pub struct ConcurrentBoundedCache<S: Source, P = NoPrefetch> {
    inner: Arc<Mutex<BoundedCache<S, P>>>,
}

#[cfg(feature = "concurrency")]
impl<S: Source, P> Clone for ConcurrentBoundedCache<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<S: Source, P> fmt::Debug for ConcurrentBoundedCache<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.lock();
        f.debug_struct("ConcurrentBoundedCache")
            .field("len", &cache.core.index.len())
            .field("cached", &cache.core.entries.len())
            .field("capacity", &cache.core.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<S: Source> ConcurrentBoundedCache<S> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(source: S, capacity: usize) -> Self {
        Self::from_cache(BoundedCache::new(source, capacity))
    }

    pub fn try_new(source: S, capacity: usize) -> Result<Self, ConfigError> {
        BoundedCache::try_new(source, capacity).map(Self::from_cache)
    }
}

#[cfg(feature = "concurrency")]
impl<S: Source, P: Prefetch<S>> ConcurrentBoundedCache<S, P> {
    pub fn from_cache(cache: BoundedCache<S, P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Runs `f` with the lock held, for compound operations.
    ///
    /// ```
    /// use seqcache::policy::bounded::ConcurrentBoundedCache;
    /// use seqcache::source::ListSource;
    ///
    /// let cache = ConcurrentBoundedCache::new(ListSource::from(vec![1, 2, 3]), 2);
    /// let sum = cache.with_lock(|c| *c.get(0).unwrap() + *c.get(2).unwrap());
    /// assert_eq!(sum, 4);
    /// ```
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut BoundedCache<S, P>) -> R) -> R {
        let mut cache = self.inner.lock();
        f(&mut cache)
    }

    pub fn get(&self, position: usize) -> Result<Arc<S::Value>, CacheError> {
        self.inner.lock().get(position)
    }

    pub fn peek(&self, position: usize) -> Option<Arc<S::Value>> {
        self.inner.lock().peek(position)
    }

    pub fn replay(&self, batch: &[Change]) -> Result<(), CacheError> {
        self.inner.lock().replay(batch)
    }

    pub fn mutate<R>(&self, edit: impl FnOnce(&mut S) -> R) -> Result<R, CacheError>
    where
        S: ObservableSource,
    {
        self.inner.lock().mutate(edit)
    }

    pub fn invalidate(&self, position: usize) -> Result<bool, CacheError> {
        self.inner.lock().invalidate(position)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn cached_len(&self) -> usize {
        self.inner.lock().cached_len()
    }

    pub fn hits(&self) -> u64 {
        self.inner.lock().hits()
    }

    pub fn misses(&self) -> u64 {
        self.inner.lock().misses()
    }

    pub fn hit_ratio(&self) -> f64 {
        self.inner.lock().hit_ratio()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }
}
