use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    flushes: AtomicU64,
    records_written: AtomicU64,
    retry_count: AtomicU64,
    failure_count: AtomicU64,
    deferred_count: AtomicU64,
}

/// Per-sink counters. Cheap to clone; clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub flushes: u64,
    /// Records in batches whose INSERT was confirmed or left running.
    pub records_written: u64,
    pub retry_count: u64,
    pub failure_count: u64,
    /// Flushes that returned before their statement finished.
    pub deferred_count: u64,
    /// Statements that failed after their flush had already returned.
    pub deferred_failures: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_flushes(&self) {
        self.inner.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records(&self, count: u64) {
        self.inner
            .records_written
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self) {
        self.inner.retry_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.inner.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deferred(&self) {
        self.inner.deferred_count.fetch_add(1, Ordering::Relaxed);
    }

    /// `deferred_failures` is tracked by the connection and passed in here.
    pub fn snapshot(&self, deferred_failures: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            flushes: self.inner.flushes.load(Ordering::Relaxed),
            records_written: self.inner.records_written.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
            failure_count: self.inner.failure_count.load(Ordering::Relaxed),
            deferred_count: self.inner.deferred_count.load(Ordering::Relaxed),
            deferred_failures,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
