//! Internal telemetry for the stream-stats engine.
//!
//! In-process counters and health state, plus tracing initialization.
//! Counters are surfaced through log lines on each aggregation cycle
//! rather than an external metrics system.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
