//! seqcache: a bounded LRU cache in front of a mutable, positionally
//! addressed sequence.
//!
//! A [`BoundedCache`](policy::bounded::BoundedCache) keeps at most
//! `capacity` values fetched from a [`Source`](traits::Source) and evicts the
//! least recently used one when full. Edits to the source are replayed as
//! ordered [`Change`](source::Change) batches, so cached values follow their
//! elements as positions shift.
//!
//! ## Layout
//!
//! | Module      | Contents                                               |
//! |-------------|--------------------------------------------------------|
//! | `ds`        | Order-statistic tree, sparse index, recency order      |
//! | `policy`    | `BoundedCache` and prefetch strategies                 |
//! | `source`    | `Change` records and the `ListSource` reference source |
//! | `traits`    | `Source` and `ObservableSource`                        |
//! | `builder`   | `BoundedCacheBuilder`                                  |
//! | `metrics`   | Optional counters and Prometheus export (`metrics`)    |
//!
//! ```
//! use seqcache::prelude::*;
//!
//! let mut cache = BoundedCache::new(ListSource::from(vec![1, 2, 3]), 2);
//! assert_eq!(*cache.get(2).unwrap(), 3);
//! cache.mutate(|list| list.remove(0)).unwrap();
//! assert_eq!(cache.peek(1).as_deref(), Some(&3));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod source;
pub mod traits;
