//! Wall-clock helpers for minute-boundary arithmetic.

use chrono::{DateTime, Utc};

/// Truncate an instant to the zero second of its wall-clock minute.
pub fn minute_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    align_down(t, 60)
}

/// Truncate an instant down to a multiple of `interval_secs` since the epoch.
pub fn align_down(t: DateTime<Utc>, interval_secs: u64) -> DateTime<Utc> {
    let interval = interval_secs.max(1) as i64;
    let secs = t.timestamp();
    let floored = secs - secs.rem_euclid(interval);
    DateTime::from_timestamp(floored, 0).unwrap_or(t)
}

/// Interpret a unix-milliseconds instant, saturating out-of-range values.
pub fn timestamp_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
