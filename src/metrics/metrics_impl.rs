use crate::metrics::traits::{
    CoreMetricsRecorder, PrefetchMetricsRecorder, ReplayMetricsRecorder,
};

#[derive(Debug, Default, Clone)]
pub struct BoundedCacheMetrics {
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
    pub invalidated_entries: u64,
    pub resyncs: u64,
}

impl BoundedCacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CoreMetricsRecorder for BoundedCacheMetrics {
    fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }

    fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    fn record_clear(&mut self) {
        self.clears += 1;
    }
}

impl ReplayMetricsRecorder for BoundedCacheMetrics {
    fn record_batch(&mut self) {
        self.batches += 1;
    }

    fn record_replayed_insert(&mut self) {
        self.replayed_inserts += 1;
    }

    fn record_replayed_delete(&mut self) {
        self.replayed_deletes += 1;
    }

    fn record_replayed_update(&mut self) {
        self.replayed_updates += 1;
    }

    fn record_invalidated_entry(&mut self) {
        self.invalidated_entries += 1;
    }

    fn record_resync(&mut self) {
        self.resyncs += 1;
    }
}

impl PrefetchMetricsRecorder for BoundedCacheMetrics {
    fn record_prefetch_load(&mut self) {
        self.prefetch_loads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_and_miss_both_count_as_get_calls() {
        let mut metrics = BoundedCacheMetrics::new();
        metrics.record_get_hit();
        metrics.record_get_miss();
        metrics.record_get_miss();
        assert_eq!(metrics.get_calls, 3);
        assert_eq!(metrics.get_hits, 1);
        assert_eq!(metrics.get_misses, 2);
        metrics.reset();
        assert_eq!(metrics.get_calls, 0);
    }
}
