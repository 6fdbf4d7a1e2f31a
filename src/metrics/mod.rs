//! Optional counters for [`BoundedCache`](crate::policy::bounded::BoundedCache).
//!
//! Enabled by the `metrics` feature. Recording, snapshotting and export are
//! split into separate traits (see [`traits`]) so the cache only ever writes
//! counters and consumers only ever read snapshots.

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
