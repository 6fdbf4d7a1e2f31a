//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting, and export are separate, composable traits.
//!
//! ```text
//!                ┌─────────────────────────────┐
//!                │     CoreMetricsRecorder     │
//!                │  get_hit/get_miss/evict     │
//!                │  clear                      │
//!                └──────────────┬──────────────┘
//!                               │
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//!   ┌──────────────────────┐          ┌──────────────────────┐
//!   │ ReplayMetricsRecorder│          │PrefetchMetricsRecorder│
//!   │ batches, records,    │          │ loads issued by the   │
//!   │ invalidations,resyncs│          │ prefetch hook         │
//!   └──────────────────────┘          └──────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters every cache records.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Counters for mutation replay.
pub trait ReplayMetricsRecorder: CoreMetricsRecorder {
    fn record_batch(&mut self);
    fn record_replayed_insert(&mut self);
    fn record_replayed_delete(&mut self);
    fn record_replayed_update(&mut self);
    /// A cached entry dropped because its position was deleted or updated.
    fn record_invalidated_entry(&mut self);
    fn record_resync(&mut self);
}

/// Counters for the prefetch hook.
pub trait PrefetchMetricsRecorder: CoreMetricsRecorder {
    fn record_prefetch_load(&mut self);
}

/// Snapshot provider for tests and benches.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Exporter for production monitoring.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
