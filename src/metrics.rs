use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Collects runtime statistics about index operations using lock-free atomic counters.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    query_count: AtomicU64,
    insert_count: AtomicU64,
    remove_count: AtomicU64,
    total_candidates_scored: AtomicU64,
    total_window_entries: AtomicU64,
    total_query_time_ns: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one search: entries visited across all windows, distinct
    /// candidates re-scored, and wall time.
    pub fn record_query(&self, window_entries: u64, candidates: u64, duration_ns: u64) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.total_window_entries
            .fetch_add(window_entries, Ordering::Relaxed);
        self.total_candidates_scored
            .fetch_add(candidates, Ordering::Relaxed);
        self.total_query_time_ns
            .fetch_add(duration_ns, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.insert_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.remove_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let query_count = self.query_count.load(Ordering::Relaxed);
        let total_query_time_ns = self.total_query_time_ns.load(Ordering::Relaxed);
        let total_candidates = self.total_candidates_scored.load(Ordering::Relaxed);
        let total_window = self.total_window_entries.load(Ordering::Relaxed);

        let per_query = |total: u64| {
            if query_count > 0 {
                total as f64 / query_count as f64
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            query_count,
            insert_count: self.insert_count.load(Ordering::Relaxed),
            remove_count: self.remove_count.load(Ordering::Relaxed),
            avg_query_time_us: per_query(total_query_time_ns) / 1000.0,
            avg_candidates_per_query: per_query(total_candidates),
            avg_window_entries_per_query: per_query(total_window),
            dedup_ratio: if total_window > 0 {
                total_candidates as f64 / total_window as f64
            } else {
                0.0
            },
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.query_count.store(0, Ordering::Relaxed);
        self.insert_count.store(0, Ordering::Relaxed);
        self.remove_count.store(0, Ordering::Relaxed);
        self.total_candidates_scored.store(0, Ordering::Relaxed);
        self.total_window_entries.store(0, Ordering::Relaxed);
        self.total_query_time_ns.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of index metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub query_count: u64,
    pub insert_count: u64,
    pub remove_count: u64,
    pub avg_query_time_us: f64,
    /// Distinct candidates re-scored with the exact distance, per query.
    pub avg_candidates_per_query: f64,
    /// Window entries visited across all axes, per query (before dedup).
    pub avg_window_entries_per_query: f64,
    /// Distinct candidates over window entries. 1.0 means the axes never agreed.
    pub dedup_ratio: f64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Queries: {}, Inserts: {}, Removes: {}, Avg query: {:.2}us, \
             Avg candidates: {:.1}, Avg window entries: {:.1}, Dedup ratio: {:.1}%",
            self.query_count,
            self.insert_count,
            self.remove_count,
            self.avg_query_time_us,
            self.avg_candidates_per_query,
            self.avg_window_entries_per_query,
            self.dedup_ratio * 100.0,
        )
    }
}

/// RAII timer for measuring operation durations.
pub(crate) struct QueryTimer {
    start: Instant,
}

impl QueryTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}
