//! Startup rehydration of the live-session table.

use chrono::{Duration, Utc};
use tracing::info;

use mysql_store::StatsStore;
use sessions::SessionsManager;
use stats_core::{Error, Result, Session};

/// Load the persisted snapshot and restore the sessions manager.
///
/// Must run before the HTTP intake is enabled; a failure here aborts
/// startup. Rows older than the optional stale horizon are discarded.
pub async fn restore_sessions(
    manager: &SessionsManager,
    store: &dyn StatsStore,
    stale_after: Option<Duration>,
) -> Result<usize> {
    let rows = store
        .load_active_sessions()
        .await
        .map_err(|e| Error::recovery(format!("load session snapshot: {e}")))?;
    let total = rows.len();

    let now = Utc::now();
    let sessions: Vec<Session> = rows
        .into_iter()
        .map(|row| row.into_session())
        .filter(|session| match stale_after {
            Some(horizon) => now.signed_duration_since(session.opened_at_utc()) <= horizon,
            None => true,
        })
        .collect();

    let discarded = total - sessions.len();
    let restored = manager.restore(sessions)?;

    if discarded > 0 {
        info!(discarded, "Discarded stale snapshot rows");
    }
    info!(restored, "Restored active sessions from snapshot");

    Ok(restored)
}
