//! Background workers for the stream-stats engine.
//!
//! The aggregator fires on wall-clock minute boundaries, rotates the
//! sessions manager's minute bucket, builds per-dimension rows, and
//! upserts them. The snapshotter mirrors the live-session table on its
//! own cadence, and recovery rehydrates the manager at startup.

pub mod aggregate;
pub mod recovery;
pub mod scheduler;
pub mod snapshot;
pub mod unique;

pub use aggregate::{build_minute, Aggregator, MinuteStats};
pub use recovery::restore_sessions;
pub use scheduler::{StatsScheduler, WorkerConfig};
pub use snapshot::Snapshotter;
pub use unique::UniqueUsers;
