//! In-process metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters for the stream-stats engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Intake
    pub batches_received: Counter,
    pub events_received: Counter,
    pub events_invalid: Counter,

    // Sessions manager
    pub sessions_opened: Counter,
    pub sessions_closed: Counter,
    pub duplicate_open: Counter,
    pub unknown_close: Counter,
    pub malformed_time: Counter,
    pub stale_events: Counter,
    pub deltas_dropped: Counter,

    // Aggregator
    pub minutes_flushed: Counter,
    pub upsert_retries: Counter,
    pub dimensions_dropped: Counter,

    // Snapshotter
    pub snapshot_runs: Counter,
    pub snapshot_errors: Counter,

    // Gauges
    pub active_sessions: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            batches_received: self.batches_received.get(),
            events_received: self.events_received.get(),
            events_invalid: self.events_invalid.get(),
            sessions_opened: self.sessions_opened.get(),
            sessions_closed: self.sessions_closed.get(),
            duplicate_open: self.duplicate_open.get(),
            unknown_close: self.unknown_close.get(),
            malformed_time: self.malformed_time.get(),
            stale_events: self.stale_events.get(),
            deltas_dropped: self.deltas_dropped.get(),
            minutes_flushed: self.minutes_flushed.get(),
            upsert_retries: self.upsert_retries.get(),
            dimensions_dropped: self.dimensions_dropped.get(),
            snapshot_runs: self.snapshot_runs.get(),
            snapshot_errors: self.snapshot_errors.get(),
            active_sessions: self.active_sessions.get(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub batches_received: u64,
    pub events_received: u64,
    pub events_invalid: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub duplicate_open: u64,
    pub unknown_close: u64,
    pub malformed_time: u64,
    pub stale_events: u64,
    pub deltas_dropped: u64,
    pub minutes_flushed: u64,
    pub upsert_retries: u64,
    pub dimensions_dropped: u64,
    pub snapshot_runs: u64,
    pub snapshot_errors: u64,
    pub active_sessions: u64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
