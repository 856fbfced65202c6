//! The persistence trait the aggregator and snapshotter write through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stats_core::{Dimension, Result};

use crate::rows::{SessionRow, StatsRow};

/// Storage operations the engine needs.
///
/// Implemented by [`crate::MySqlStore`] in production and by an in-memory
/// mock in the integration tests, so the full ingest → aggregate → persist
/// path is exercised without a database.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Batched insert-or-replace of one dimension table for one minute.
    ///
    /// Keyed by the table's primary key; replaying the same rows must
    /// produce the same table contents.
    async fn upsert_stats(
        &self,
        minute: DateTime<Utc>,
        dimension: Dimension,
        rows: &[StatsRow],
    ) -> Result<()>;

    /// Mirror the live-session table: upsert the given rows, then delete
    /// rows whose session ids are not among them.
    async fn sync_active_sessions(&self, rows: &[SessionRow]) -> Result<()>;

    /// Read the whole snapshot table, for recovery at startup.
    async fn load_active_sessions(&self) -> Result<Vec<SessionRow>>;
}
