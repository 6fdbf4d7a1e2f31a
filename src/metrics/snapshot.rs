#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoundedCacheMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub evicted_entries: u64,
    pub clears: u64,
    pub prefetch_loads: u64,

    pub batches: u64,
    pub replayed_inserts: u64,
    pub replayed_deletes: u64,
    pub replayed_updates: u64,
    pub invalidated_entries: u64, // entries dropped by delete/update replay or invalidate()
    pub resyncs: u64,

    // gauges captured at snapshot time
    pub cached_entries: usize,
    pub capacity: usize,
    pub sequence_len: usize,
    pub index_nodes: usize,
}

impl BoundedCacheMetricsSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }
}
