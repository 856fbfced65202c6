//! Webhook event schema and validation.
//!
//! Origin servers POST batches of these events to `/api/webhook`. The
//! transport layer validates them here before anything reaches the
//! sessions manager; unknown fields are ignored on deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};

/// Lifecycle event kinds delivered by origin servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PlayStarted,
    PlayClosed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayStarted => "play_started",
            Self::PlayClosed => "play_closed",
        }
    }
}

/// A single session lifecycle event from an origin server.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StreamEvent {
    /// Event emission time (RFC 3339 UTC).
    pub time: DateTime<Utc>,
    pub event: EventKind,
    /// Session identifier, globally unique across servers.
    #[validate(length(min = 1, max = 128))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub server: String,
    /// Channel name.
    #[validate(length(min = 1, max = 100))]
    pub media: String,
    #[validate(length(max = 100))]
    pub user_id: String,
    #[validate(length(max = 45))]
    pub ip: String,
    /// ISO-2 country code, possibly empty.
    #[validate(length(max = 2))]
    pub country: String,
    #[validate(length(max = 20))]
    pub proto: String,
    /// Byte counter: usually 0 on `play_started`, the final total on
    /// `play_closed`.
    pub bytes: u64,
    #[validate(length(max = 512))]
    pub user_agent: String,
    /// Unix milliseconds at which the session opened.
    pub opened_at: i64,

    /// Unix milliseconds at which the session closed (`play_closed` only).
    #[serde(default)]
    pub closed_at: Option<i64>,
    /// Close reason (`play_closed` only).
    #[serde(default)]
    pub reason: Option<String>,
}

/// Validates a single event against its schema.
///
/// Runs the derive validations, then the cross-field rules: `play_closed`
/// events must carry `closed_at` and `reason`.
pub fn validate_event(event: &StreamEvent) -> Result<()> {
    event
        .validate()
        .map_err(|e| Error::validation(e.to_string()))?;

    if event.event == EventKind::PlayClosed {
        if event.closed_at.is_none() {
            return Err(Error::missing_field("closed_at"));
        }
        if event.reason.is_none() {
            return Err(Error::missing_field("reason"));
        }
    }

    Ok(())
}

/// Validates a batch; the first invalid event fails the whole batch.
pub fn validate_batch(events: &[StreamEvent]) -> Result<()> {
    for (i, event) in events.iter().enumerate() {
        validate_event(event).map_err(|e| Error::validation(format!("event[{i}]: {e}")))?;
    }
    Ok(())
}
