//! Minute-row building and persistence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use mysql_store::{StatsRow, StatsStore};
use sessions::{RotatedMinute, SessionsManager};
use stats_core::{Delta, DeltaKind, Dimension};
use telemetry::metrics;

use crate::scheduler::WorkerConfig;
use crate::unique::UniqueUsers;

/// The rows for one completed minute, ready to persist.
#[derive(Default)]
pub struct MinuteStats {
    /// `None` when the minute saw no events and no live sessions.
    pub global: Option<StatsRow>,
    pub breakdowns: Vec<(Dimension, Vec<StatsRow>)>,
}

#[derive(Default)]
struct Accum {
    started: u64,
    closed: u64,
    bytes: u64,
    watch_secs: u64,
    users: UniqueUsers,
}

impl Accum {
    fn apply(&mut self, delta: &Delta) {
        match delta.kind {
            DeltaKind::Opened => self.started += 1,
            DeltaKind::Closed => {
                self.closed += 1;
                self.bytes += delta.bytes;
                self.watch_secs += delta.watch_time_secs;
            }
        }
        self.users.insert(&delta.dims.user_id);
    }

    fn into_row(mut self, value: String, peak: u64, interval_secs: u64) -> StatsRow {
        StatsRow {
            dimension_value: value,
            sessions_started: self.started,
            sessions_closed: self.closed,
            total_bytes: self.bytes,
            bandwidth_bps: self.bytes / interval_secs.max(1),
            watch_time_seconds: self.watch_secs,
            unique_users: self.users.cardinality(),
            peak_concurrent: peak,
        }
    }
}

/// Derive all dimension rows for a rotated minute.
///
/// Counters come from the drained deltas; peaks from the bucket. A row is
/// emitted for every dimension value seen in a delta this minute plus
/// every value with live sessions at rotation time, so quiet minutes still
/// draw flat concurrency lines. The global row is computed independently
/// of the breakdowns: its counters sum all deltas, its peak is the maximum
/// over all sessions regardless of key.
pub fn build_minute(rotated: &RotatedMinute, interval_secs: u64) -> MinuteStats {
    let mut global = Accum::default();
    let mut per_dim: Vec<(Dimension, HashMap<String, Accum>)> = Dimension::BREAKDOWNS
        .iter()
        .map(|dim| (*dim, HashMap::new()))
        .collect();

    for delta in &rotated.deltas {
        global.apply(delta);
        for (dim, accums) in per_dim.iter_mut() {
            if let Some(value) = delta.dims.value(*dim) {
                accums.entry(value.to_string()).or_default().apply(delta);
            }
        }
    }

    let mut breakdowns = Vec::with_capacity(per_dim.len());
    for (dim, mut accums) in per_dim {
        for key in rotated.bucket.keys(dim) {
            accums.entry(key).or_default();
        }

        let mut rows: Vec<StatsRow> = accums
            .into_iter()
            .map(|(value, accum)| {
                let peak = rotated.bucket.peak(dim, &value);
                accum.into_row(value, peak, interval_secs)
            })
            .collect();
        rows.sort_by(|a, b| a.dimension_value.cmp(&b.dimension_value));
        breakdowns.push((dim, rows));
    }

    let global = if rotated.deltas.is_empty() && rotated.bucket.is_empty() {
        None
    } else {
        Some(global.into_row(String::new(), rotated.bucket.peak_total, interval_secs))
    };

    MinuteStats { global, breakdowns }
}

/// Rotates the manager at minute boundaries and persists the rows.
pub struct Aggregator {
    manager: Arc<SessionsManager>,
    store: Arc<dyn StatsStore>,
    config: WorkerConfig,
}

impl Aggregator {
    pub fn new(
        manager: Arc<SessionsManager>,
        store: Arc<dyn StatsStore>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            manager,
            store,
            config,
        }
    }

    /// Rotate, build, and persist one completed minute.
    ///
    /// Row building and store writes happen outside the manager's critical
    /// section, on the immutable rotated data. A dimension whose upsert
    /// keeps failing is dropped; the remaining dimensions still persist.
    pub async fn flush_minute(&self, minute: DateTime<Utc>) {
        let rotated = self.manager.rotate_minute();
        if rotated.dropped > 0 {
            warn!(
                dropped = rotated.dropped,
                "Delta buffer overflowed; counters for dropped events are lost"
            );
        }

        let stats = build_minute(&rotated, self.config.aggregation_interval.as_secs());

        if let Some(global) = &stats.global {
            self.upsert_with_retry(minute, Dimension::Global, std::slice::from_ref(global))
                .await;
        }
        for (dim, rows) in &stats.breakdowns {
            if !rows.is_empty() {
                self.upsert_with_retry(minute, *dim, rows).await;
            }
        }

        metrics().minutes_flushed.inc();
        let (started, closed) = stats
            .global
            .as_ref()
            .map(|g| (g.sessions_started, g.sessions_closed))
            .unwrap_or((0, 0));
        info!(
            minute = %minute.format("%Y-%m-%dT%H:%M"),
            started,
            closed,
            active = self.manager.live_len(),
            "Aggregation complete"
        );
    }

    async fn upsert_with_retry(
        &self,
        minute: DateTime<Utc>,
        dimension: Dimension,
        rows: &[StatsRow],
    ) {
        let mut backoff = self.config.initial_backoff;
        for attempt in 1..=self.config.max_upsert_attempts {
            match self.store.upsert_stats(minute, dimension, rows).await {
                Ok(()) => return,
                Err(e) if attempt < self.config.max_upsert_attempts => {
                    metrics().upsert_retries.inc();
                    warn!(
                        attempt,
                        table = dimension.table(),
                        error = %e,
                        "Upsert failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    metrics().dimensions_dropped.inc();
                    error!(
                        minute = %minute,
                        table = dimension.table(),
                        error = %e,
                        "Dropping minute rows after retries"
                    );
                }
            }
        }
    }
}
