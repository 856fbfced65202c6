//! The sessions manager: lifecycle handling and the minute-rotation
//! contract consumed by the aggregator.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use stats_core::{
    minute_floor, timestamp_ms, Delta, DeltaKind, Error, EventKind, Result, Session, StreamEvent,
};
use telemetry::metrics;

use crate::bucket::{LiveCounts, MinuteBucket};

/// Default bound on the intra-minute delta buffer.
pub const DEFAULT_DELTA_CAPACITY: usize = 100_000;

/// Why an event was not applied to the live table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    /// `play_started` for a session id that is already live.
    DuplicateOpen,
    /// `play_closed` for a session id that is not live.
    UnknownClose,
    /// Instants that cannot be interpreted (non-positive `opened_at` or
    /// `closed_at`).
    MalformedTime,
}

impl RejectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateOpen => "duplicate_open",
            Self::UnknownClose => "unknown_close",
            Self::MalformedTime => "malformed_time",
        }
    }
}

/// Result of ingesting one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    /// Accepted and counted into the current minute, but the event's own
    /// instant predates the current minute boundary by more than a full
    /// minute.
    AcceptedStale,
    Rejected(RejectKind),
}

impl IngestOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// The immutable outcome of one minute rotation.
#[derive(Debug)]
pub struct RotatedMinute {
    /// Peak/live tracking for the completed minute.
    pub bucket: MinuteBucket,
    /// Deltas ingested during the minute, in arrival order.
    pub deltas: Vec<Delta>,
    /// Deltas dropped to the buffer bound during the minute.
    pub dropped: u64,
}

/// Current live counts for `/stats/active`.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveCounts {
    pub total: u64,
    pub by_server: BTreeMap<String, u64>,
    pub by_channel: BTreeMap<String, u64>,
    pub by_country: BTreeMap<String, u64>,
    pub by_protocol: BTreeMap<String, u64>,
    pub by_user_agent_class: BTreeMap<String, u64>,
}

struct State {
    live: HashMap<String, Session>,
    counts: LiveCounts,
    bucket: MinuteBucket,
    deltas: VecDeque<Delta>,
    dropped_deltas: u64,
    restored: bool,
}

/// Thread-safe owner of the live-session table.
///
/// One mutex protects the (live table, minute bucket, delta buffer) triple;
/// every ingest is O(dimensions) inside the critical section, and rotation
/// is a pointer swap plus a buffer drain.
pub struct SessionsManager {
    state: Mutex<State>,
    delta_capacity: usize,
}

impl SessionsManager {
    pub fn new(delta_capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                live: HashMap::new(),
                counts: LiveCounts::default(),
                bucket: MinuteBucket::default(),
                deltas: VecDeque::new(),
                dropped_deltas: 0,
                restored: false,
            }),
            delta_capacity: delta_capacity.max(1),
        }
    }

    /// Apply one validated event to the live table and the current minute.
    pub fn ingest(&self, event: &StreamEvent) -> IngestOutcome {
        let outcome = match event.event {
            EventKind::PlayStarted => self.handle_open(event),
            EventKind::PlayClosed => self.handle_close(event),
        };

        match outcome {
            IngestOutcome::Accepted => {}
            IngestOutcome::AcceptedStale => metrics().stale_events.inc(),
            IngestOutcome::Rejected(kind) => {
                match kind {
                    RejectKind::DuplicateOpen => metrics().duplicate_open.inc(),
                    RejectKind::UnknownClose => metrics().unknown_close.inc(),
                    RejectKind::MalformedTime => metrics().malformed_time.inc(),
                }
                debug!(id = %event.id, kind = kind.as_str(), "event rejected");
            }
        }

        outcome
    }

    fn handle_open(&self, event: &StreamEvent) -> IngestOutcome {
        if event.opened_at <= 0 {
            return IngestOutcome::Rejected(RejectKind::MalformedTime);
        }

        let now = Utc::now();
        let session = Session::from_open_event(event, now);
        let dims = session.dimensions();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.live.contains_key(&session.id) {
            return IngestOutcome::Rejected(RejectKind::DuplicateOpen);
        }

        state.counts.increment(&dims);
        state.bucket.observe_open(&state.counts, &dims);
        push_delta(
            state,
            self.delta_capacity,
            Delta {
                kind: DeltaKind::Opened,
                dims,
                bytes: 0,
                watch_time_secs: 0,
                at: event.time,
            },
        );
        state.live.insert(session.id.clone(), session);

        metrics().sessions_opened.inc();
        metrics().active_sessions.set(state.counts.total);

        accepted(event)
    }

    fn handle_close(&self, event: &StreamEvent) -> IngestOutcome {
        let closed_at = match event.closed_at {
            Some(ms) if ms > 0 => ms,
            _ => return IngestOutcome::Rejected(RejectKind::MalformedTime),
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(mut session) = state.live.remove(&event.id) else {
            return IngestOutcome::Rejected(RejectKind::UnknownClose);
        };

        let watch_time_secs = ((closed_at - session.opened_at).max(0) / 1000) as u64;
        let bytes_delta = event.bytes.saturating_sub(session.bytes);
        session.close_reason = event.reason.clone();

        let dims = session.dimensions();
        state.counts.decrement(&dims);
        push_delta(
            state,
            self.delta_capacity,
            Delta {
                kind: DeltaKind::Closed,
                dims,
                bytes: bytes_delta,
                watch_time_secs,
                at: timestamp_ms(closed_at),
            },
        );

        metrics().sessions_closed.inc();
        metrics().active_sessions.set(state.counts.total);
        debug!(
            id = %session.id,
            reason = session.close_reason.as_deref().unwrap_or(""),
            watch_time_secs,
            "session closed"
        );

        accepted(event)
    }

    /// Swap in a fresh minute bucket and drain the delta buffer.
    ///
    /// The returned data is immutable; subsequent ingests only touch the
    /// fresh bucket. This is the aggregator's single synchronization point
    /// per minute.
    pub fn rotate_minute(&self) -> RotatedMinute {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let fresh = MinuteBucket::seeded_from(&state.counts);
        let bucket = std::mem::replace(&mut state.bucket, fresh);
        let deltas = std::mem::take(&mut state.deltas).into_iter().collect();
        let dropped = std::mem::take(&mut state.dropped_deltas);

        RotatedMinute {
            bucket,
            deltas,
            dropped,
        }
    }

    /// Copy of every live session, for the snapshot writer.
    pub fn snapshot_live(&self) -> Vec<Session> {
        self.state.lock().live.values().cloned().collect()
    }

    /// Rehydrate the live table from a persisted snapshot.
    ///
    /// Allowed exactly once, before intake is enabled. Restored sessions
    /// seed the live counts (and therefore the next minute's peaks) but
    /// emit no deltas: they were started by a prior process.
    pub fn restore(&self, sessions: Vec<Session>) -> Result<usize> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.restored {
            return Err(Error::recovery("live sessions already restored"));
        }
        state.restored = true;

        for session in sessions {
            let dims = session.dimensions();
            if state.live.insert(session.id.clone(), session).is_none() {
                state.counts.increment(&dims);
            }
        }
        state.bucket = MinuteBucket::seeded_from(&state.counts);
        metrics().active_sessions.set(state.counts.total);

        Ok(state.live.len())
    }

    /// Current live counts across all dimensions.
    pub fn active_counts(&self) -> ActiveCounts {
        let guard = self.state.lock();
        let counts = &guard.counts;
        ActiveCounts {
            total: counts.total,
            by_server: counts.by_server.iter().map(owned).collect(),
            by_channel: counts.by_channel.iter().map(owned).collect(),
            by_country: counts.by_country.iter().map(owned).collect(),
            by_protocol: counts.by_proto.iter().map(owned).collect(),
            by_user_agent_class: counts
                .by_ua_class
                .iter()
                .map(|(class, n)| (class.as_str().to_string(), *n))
                .collect(),
        }
    }

    /// Number of live sessions.
    pub fn live_len(&self) -> usize {
        self.state.lock().live.len()
    }
}

fn owned((key, n): (&String, &u64)) -> (String, u64) {
    (key.clone(), *n)
}

fn accepted(event: &StreamEvent) -> IngestOutcome {
    let boundary = minute_floor(Utc::now());
    if event.time < boundary - Duration::seconds(60) {
        IngestOutcome::AcceptedStale
    } else {
        IngestOutcome::Accepted
    }
}

fn push_delta(state: &mut State, capacity: usize, delta: Delta) {
    if state.deltas.len() >= capacity {
        state.deltas.pop_front();
        state.dropped_deltas += 1;
        metrics().deltas_dropped.inc();
    }
    state.deltas.push_back(delta);
}
