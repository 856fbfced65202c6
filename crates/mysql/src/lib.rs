//! MySQL persistence for the stream-stats engine.
//!
//! Two concerns live here: the per-minute dimension tables written by the
//! aggregator (batched insert-or-replace), and the `active_sessions`
//! snapshot table that backs crash recovery. Both sit behind the
//! [`StatsStore`] trait so tests can substitute an in-memory store.

pub mod client;
pub mod config;
pub mod health;
pub mod rows;
pub mod schema;
pub mod store;

pub use client::MySqlStore;
pub use config::StoreConfig;
pub use rows::{SessionRow, StatsRow};
pub use store::StatsStore;
