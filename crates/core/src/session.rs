//! The live session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{classify, UaClass};
use crate::delta::Dimensions;
use crate::event::StreamEvent;
use crate::time::timestamp_ms;

/// One viewer's playback engagement with one channel on one server.
///
/// Lives in the manager's in-memory table from `play_started` until
/// `play_closed`, and is mirrored to the `active_sessions` table for crash
/// recovery. `close_reason` stays `None` while the session is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub server: String,
    pub channel: String,
    pub country: String,
    pub proto: String,
    pub user_agent: String,
    pub ua_class: UaClass,
    pub user_id: String,
    pub ip: String,
    /// Unix milliseconds reported by the origin server.
    pub opened_at: i64,
    pub last_seen_at: DateTime<Utc>,
    /// Cumulative bytes as last reported.
    pub bytes: u64,
    pub close_reason: Option<String>,
}

impl Session {
    /// Builds a live session from an accepted `play_started` event.
    ///
    /// Anonymous events (empty `user_id`) fall back to the session id so
    /// unique-user counting still sees one distinct viewer per session.
    pub fn from_open_event(event: &StreamEvent, now: DateTime<Utc>) -> Self {
        let user_id = if event.user_id.is_empty() {
            event.id.clone()
        } else {
            event.user_id.clone()
        };

        Self {
            id: event.id.clone(),
            server: event.server.clone(),
            channel: event.media.clone(),
            country: event.country.clone(),
            proto: event.proto.clone(),
            user_agent: event.user_agent.clone(),
            ua_class: classify(&event.user_agent),
            user_id,
            ip: event.ip.clone(),
            opened_at: event.opened_at,
            last_seen_at: now,
            bytes: event.bytes,
            close_reason: None,
        }
    }

    /// The session's grouping values across the breakdown dimensions.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            server: self.server.clone(),
            channel: self.channel.clone(),
            country: self.country.clone(),
            proto: self.proto.clone(),
            ua_class: self.ua_class,
            user_id: self.user_id.clone(),
        }
    }

    /// `opened_at` as an instant.
    pub fn opened_at_utc(&self) -> DateTime<Utc> {
        timestamp_ms(self.opened_at)
    }
}
