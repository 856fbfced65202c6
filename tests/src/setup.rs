//! Common test setup.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use aggregator::{StatsScheduler, WorkerConfig};
use api::{router, AppState};
use mysql_store::StatsStore;
use sessions::{SessionsManager, DEFAULT_DELTA_CAPACITY};

use crate::mocks::MockStore;

/// Assembled engine with the real router, manager, and workers, backed by
/// the in-memory store. Minutes are flushed explicitly instead of waiting
/// for wall-clock boundaries.
pub struct TestContext {
    pub manager: Arc<SessionsManager>,
    pub store: Arc<MockStore>,
    pub scheduler: Arc<StatsScheduler>,
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_delta_capacity(DEFAULT_DELTA_CAPACITY)
    }

    pub fn with_delta_capacity(capacity: usize) -> Self {
        let manager = Arc::new(SessionsManager::new(capacity));
        let store = Arc::new(MockStore::new());

        let config = WorkerConfig {
            aggregation_interval: Duration::from_secs(60),
            snapshot_interval: Duration::from_secs(30),
            max_upsert_attempts: 2,
            initial_backoff: Duration::from_millis(10),
        };
        let scheduler = Arc::new(StatsScheduler::new(
            config,
            manager.clone(),
            store.clone() as Arc<dyn StatsStore>,
        ));

        let state = AppState::new(manager.clone());
        let router = router(state.clone());

        Self {
            manager,
            store,
            scheduler,
            state,
            router,
        }
    }

    /// Mark recovery complete so `/health` serves 200.
    pub fn mark_ready(&self) {
        self.state.set_ready();
    }

    /// Flush the current minute into the store.
    pub async fn flush(&self) {
        self.scheduler.final_flush().await;
    }

    /// Flush the current bucket under an explicit minute label.
    pub async fn flush_at(&self, minute: chrono::DateTime<chrono::Utc>) {
        self.scheduler.flush_minute(minute).await;
    }

    /// Run one snapshot pass into the store.
    pub async fn snapshot(&self) {
        self.scheduler.snapshot_once().await;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
