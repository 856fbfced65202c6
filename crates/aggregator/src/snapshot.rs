//! Periodic mirror of the live-session table for crash recovery.

use std::sync::Arc;

use tracing::{debug, warn};

use mysql_store::{SessionRow, StatsStore};
use sessions::SessionsManager;
use telemetry::metrics;

/// Writes the live-session view to the `active_sessions` table.
pub struct Snapshotter {
    manager: Arc<SessionsManager>,
    store: Arc<dyn StatsStore>,
}

impl Snapshotter {
    pub fn new(manager: Arc<SessionsManager>, store: Arc<dyn StatsStore>) -> Self {
        Self { manager, store }
    }

    /// One snapshot pass: upsert survivors, prune departed rows.
    ///
    /// A failure here is transient by definition; the next tick retries
    /// with a fresh view.
    pub async fn run_once(&self) {
        let rows: Vec<SessionRow> = self
            .manager
            .snapshot_live()
            .iter()
            .map(SessionRow::from)
            .collect();

        match self.store.sync_active_sessions(&rows).await {
            Ok(()) => {
                metrics().snapshot_runs.inc();
                debug!(rows = rows.len(), "Active sessions synced");
            }
            Err(e) => {
                metrics().snapshot_errors.inc();
                warn!(error = %e, "Session snapshot failed; will retry on next tick");
            }
        }
    }
}
