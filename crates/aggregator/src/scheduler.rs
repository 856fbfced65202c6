//! Background worker scheduling.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::info;

use mysql_store::StatsStore;
use sessions::SessionsManager;
use stats_core::align_down;

use crate::aggregate::Aggregator;
use crate::snapshot::Snapshotter;

/// Worker cadence and retry policy.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Aggregation boundary interval.
    pub aggregation_interval: Duration,
    /// Session snapshot interval.
    pub snapshot_interval: Duration,
    /// Attempts per dimension upsert before the minute's rows are dropped.
    pub max_upsert_attempts: u32,
    /// First retry backoff; doubles per attempt.
    pub initial_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            aggregation_interval: Duration::from_secs(60),
            snapshot_interval: Duration::from_secs(30),
            max_upsert_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Drives the aggregator and snapshotter on their cadences.
pub struct StatsScheduler {
    aggregator: Aggregator,
    snapshotter: Snapshotter,
    config: WorkerConfig,
}

impl StatsScheduler {
    pub fn new(
        config: WorkerConfig,
        manager: Arc<SessionsManager>,
        store: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(manager.clone(), store.clone(), config.clone()),
            snapshotter: Snapshotter::new(manager, store),
            config,
        }
    }

    /// Starts both workers; abort the handles to stop them.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_aggregation_loop().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_snapshot_loop().await;
        }));

        info!("Background workers started");
        handles
    }

    /// Fires at wall-clock boundaries, re-aligned from the clock on every
    /// pass so timer drift never accumulates. When the process falls
    /// behind, each missed boundary fires once, in order; the intermediate
    /// rotations carry no deltas and emit only the live concurrency line.
    async fn run_aggregation_loop(&self) {
        let interval_secs = self.config.aggregation_interval.as_secs().max(1);
        let step = chrono::Duration::seconds(interval_secs as i64);
        let mut boundary = align_down(Utc::now(), interval_secs) + step;

        loop {
            let wait = (boundary - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            let target = align_down(Utc::now(), interval_secs);
            while boundary <= target {
                self.aggregator.flush_minute(boundary - step).await;
                boundary += step;
            }
        }
    }

    async fn run_snapshot_loop(&self) {
        let mut ticker = interval(self.config.snapshot_interval);
        loop {
            ticker.tick().await;
            self.snapshotter.run_once().await;
        }
    }

    /// Rotate and persist one minute under the given label.
    pub async fn flush_minute(&self, minute: chrono::DateTime<Utc>) {
        self.aggregator.flush_minute(minute).await;
    }

    /// Flush the in-progress minute; part of graceful shutdown.
    pub async fn final_flush(&self) {
        let interval_secs = self.config.aggregation_interval.as_secs().max(1);
        let minute = align_down(Utc::now(), interval_secs);
        self.aggregator.flush_minute(minute).await;
    }

    /// Run one snapshot pass; part of graceful shutdown.
    pub async fn snapshot_once(&self) {
        self.snapshotter.run_once().await;
    }
}
