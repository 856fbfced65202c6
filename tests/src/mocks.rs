//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use mysql_store::{SessionRow, StatsRow, StatsStore};
use stats_core::{Dimension, Error, Result};

/// In-memory store that captures every write.
///
/// Implements the same `StatsStore` trait as the real MySQL store, so the
/// full ingest → rotate → persist path runs against production code with
/// only the SQL transport replaced.
#[derive(Default)]
pub struct MockStore {
    upserts: Mutex<Vec<(DateTime<Utc>, Dimension, Vec<StatsRow>)>>,
    sessions: Mutex<Vec<SessionRow>>,
    should_fail: Mutex<bool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All upserts against one dimension table, in write order.
    pub fn upserts_for(&self, dimension: Dimension) -> Vec<(DateTime<Utc>, Vec<StatsRow>)> {
        self.upserts
            .lock()
            .iter()
            .filter(|(_, dim, _)| *dim == dimension)
            .map(|(minute, _, rows)| (*minute, rows.clone()))
            .collect()
    }

    /// The latest upserted rows for one dimension table, if any.
    pub fn last_rows(&self, dimension: Dimension) -> Option<Vec<StatsRow>> {
        self.upserts_for(dimension).pop().map(|(_, rows)| rows)
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().len()
    }

    /// Current contents of the mock `active_sessions` table.
    pub fn session_rows(&self) -> Vec<SessionRow> {
        self.sessions.lock().clone()
    }

    /// Pre-seed the snapshot table, for recovery tests.
    pub fn seed_sessions(&self, rows: Vec<SessionRow>) {
        *self.sessions.lock() = rows;
    }

    /// Make every store operation fail, for retry tests.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    fn check_failure(&self) -> Result<()> {
        if *self.should_fail.lock() {
            Err(Error::store("mock store failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StatsStore for MockStore {
    async fn upsert_stats(
        &self,
        minute: DateTime<Utc>,
        dimension: Dimension,
        rows: &[StatsRow],
    ) -> Result<()> {
        self.check_failure()?;
        // Insert-or-replace keyed by (minute, dimension): replaying the
        // same minute overwrites the earlier rows, as MySQL would.
        let mut upserts = self.upserts.lock();
        upserts.retain(|(m, d, _)| !(*m == minute && *d == dimension));
        upserts.push((minute, dimension, rows.to_vec()));
        Ok(())
    }

    async fn sync_active_sessions(&self, rows: &[SessionRow]) -> Result<()> {
        self.check_failure()?;
        // Upsert-then-prune collapses to replacement for an in-memory table.
        *self.sessions.lock() = rows.to_vec();
        Ok(())
    }

    async fn load_active_sessions(&self) -> Result<Vec<SessionRow>> {
        self.check_failure()?;
        Ok(self.sessions.lock().clone())
    }
}
