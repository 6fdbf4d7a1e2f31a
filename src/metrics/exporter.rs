use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::BoundedCacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// directly or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", suffix, value);
    }

    fn write_gauge(&self, suffix: &str, value: usize) {
        self.write_metric("gauge", suffix, value as u64);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<BoundedCacheMetricsSnapshot>
    for PrometheusTextExporter<W>
{
    fn export(&self, snapshot: &BoundedCacheMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("clears_total", snapshot.clears);
        self.write_counter("prefetch_loads_total", snapshot.prefetch_loads);
        self.write_counter("replay_batches_total", snapshot.batches);
        self.write_counter("replayed_inserts_total", snapshot.replayed_inserts);
        self.write_counter("replayed_deletes_total", snapshot.replayed_deletes);
        self.write_counter("replayed_updates_total", snapshot.replayed_updates);
        self.write_counter("invalidated_entries_total", snapshot.invalidated_entries);
        self.write_counter("resyncs_total", snapshot.resyncs);
        self.write_gauge("cached_entries", snapshot.cached_entries);
        self.write_gauge("capacity", snapshot.capacity);
        self.write_gauge("sequence_len", snapshot.sequence_len);
        self.write_gauge("index_nodes", snapshot.index_nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_prefixed_counters_and_gauges() {
        let exporter = PrometheusTextExporter::new("seqcache", Vec::new());
        let snapshot = BoundedCacheMetricsSnapshot {
            get_hits: 3,
            cached_entries: 2,
            ..Default::default()
        };
        exporter.export(&snapshot);
        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains(
            "# TYPE seqcache_get_hits_total counter\nseqcache_get_hits_total 3\n"
        ));
        assert!(text.contains(
            "# TYPE seqcache_cached_entries gauge\nseqcache_cached_entries 2\n"
        ));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        exporter.export(&BoundedCacheMetricsSnapshot::default());
        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("\nresyncs_total 0\n"));
    }
}
