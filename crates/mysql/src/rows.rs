//! Row types for the stats and snapshot tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stats_core::{classify, Session, UaClass};

/// One upserted row of a per-minute stats table.
///
/// `dimension_value` is empty for the global table, which is keyed by the
/// minute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRow {
    pub dimension_value: String,
    pub sessions_started: u64,
    pub sessions_closed: u64,
    pub total_bytes: u64,
    pub bandwidth_bps: u64,
    pub watch_time_seconds: u64,
    /// Persisted as a cardinality, not a set.
    pub unique_users: u64,
    pub peak_concurrent: u64,
}

/// One row of the `active_sessions` snapshot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub server: String,
    pub channel: String,
    pub country: String,
    pub protocol: String,
    pub user_agent: String,
    pub user_agent_class: String,
    pub user_id: String,
    pub ip: String,
    pub opened_at: i64,
    pub last_seen_at: DateTime<Utc>,
    pub bytes: u64,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            server: session.server.clone(),
            channel: session.channel.clone(),
            country: session.country.clone(),
            protocol: session.proto.clone(),
            user_agent: session.user_agent.clone(),
            user_agent_class: session.ua_class.as_str().to_string(),
            user_id: session.user_id.clone(),
            ip: session.ip.clone(),
            opened_at: session.opened_at,
            last_seen_at: session.last_seen_at,
            bytes: session.bytes,
        }
    }
}

impl SessionRow {
    /// Rehydrate a live session from its snapshot row.
    ///
    /// Falls back to reclassifying the raw user-agent when the stored class
    /// does not parse; the classifier is deterministic, so this yields the
    /// value the session had before the restart.
    pub fn into_session(self) -> Session {
        let ua_class = self
            .user_agent_class
            .parse::<UaClass>()
            .unwrap_or_else(|_| classify(&self.user_agent));

        Session {
            id: self.id,
            server: self.server,
            channel: self.channel,
            country: self.country,
            proto: self.protocol,
            user_agent: self.user_agent,
            ua_class,
            user_id: self.user_id,
            ip: self.ip,
            opened_at: self.opened_at,
            last_seen_at: self.last_seen_at,
            bytes: self.bytes,
            close_reason: None,
        }
    }
}
