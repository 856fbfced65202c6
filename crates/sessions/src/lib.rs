//! Active sessions manager.
//!
//! The in-memory state machine that owns session lifecycle, deduplication,
//! and per-minute concurrency tracking. One mutex protects the triple
//! (live-session table, current minute bucket, delta buffer); every public
//! operation is atomic with respect to it.

pub mod bucket;
pub mod manager;

pub use bucket::{LiveCounts, MinuteBucket};
pub use manager::{
    ActiveCounts, IngestOutcome, RejectKind, RotatedMinute, SessionsManager,
    DEFAULT_DELTA_CAPACITY,
};
