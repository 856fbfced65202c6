//! Event generators matching the webhook schema.

use chrono::Utc;
use uuid::Uuid;

/// A valid `play_started` event opened now.
pub fn play_started(id: &str, server: &str, media: &str, user_id: &str) -> serde_json::Value {
    play_started_at(id, server, media, user_id, Utc::now().timestamp_millis())
}

/// A valid `play_started` event with an explicit `opened_at`.
pub fn play_started_at(
    id: &str,
    server: &str,
    media: &str,
    user_id: &str,
    opened_at_ms: i64,
) -> serde_json::Value {
    serde_json::json!({
        "time": Utc::now().to_rfc3339(),
        "event": "play_started",
        "id": id,
        "server": server,
        "media": media,
        "user_id": user_id,
        "ip": "203.0.113.9",
        "country": "AU",
        "proto": "hls",
        "bytes": 0,
        "user_agent": "Lavf57.83.100",
        "opened_at": opened_at_ms
    })
}

/// A valid `play_closed` event closing now.
pub fn play_closed(id: &str, bytes: u64, watch_ms: i64) -> serde_json::Value {
    let now = Utc::now().timestamp_millis();
    play_closed_at(id, bytes, now - watch_ms, now)
}

/// A valid `play_closed` event with explicit instants.
pub fn play_closed_at(
    id: &str,
    bytes: u64,
    opened_at_ms: i64,
    closed_at_ms: i64,
) -> serde_json::Value {
    serde_json::json!({
        "time": Utc::now().to_rfc3339(),
        "event": "play_closed",
        "id": id,
        "server": "s1",
        "media": "c1",
        "user_id": "u1",
        "ip": "203.0.113.9",
        "country": "AU",
        "proto": "hls",
        "bytes": bytes,
        "user_agent": "Lavf57.83.100",
        "opened_at": opened_at_ms,
        "closed_at": closed_at_ms,
        "reason": "stop"
    })
}

/// A `play_started` with a random session id.
pub fn random_open() -> serde_json::Value {
    play_started(&Uuid::new_v4().to_string(), "s1", "c1", "u1")
}

/// Serialize events as the array body the webhook expects.
pub fn array_payload(events: &[serde_json::Value]) -> String {
    serde_json::to_string(events).unwrap()
}
