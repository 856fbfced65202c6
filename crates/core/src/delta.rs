//! Delta records: the per-event derivatives consumed by the aggregator.

use chrono::{DateTime, Utc};

use crate::classifier::UaClass;
use crate::dimension::Dimension;

/// The dimension values of a session at event time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub server: String,
    pub channel: String,
    pub country: String,
    pub proto: String,
    pub ua_class: UaClass,
    pub user_id: String,
}

impl Dimensions {
    /// The grouping key for one breakdown dimension.
    ///
    /// Returns `None` for [`Dimension::Global`], which has no key.
    pub fn value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Global => None,
            Dimension::Server => Some(&self.server),
            Dimension::Channel => Some(&self.channel),
            Dimension::Country => Some(&self.country),
            Dimension::Protocol => Some(&self.proto),
            Dimension::UserAgentClass => Some(self.ua_class.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Opened,
    Closed,
}

/// Append-only record of one accepted event, attributed to the wall-clock
/// minute it was ingested in.
#[derive(Debug, Clone)]
pub struct Delta {
    pub kind: DeltaKind,
    pub dims: Dimensions,
    /// Bytes attributable to the minute; zero for `Opened`.
    pub bytes: u64,
    /// Watch-time in whole seconds; zero for `Opened`.
    pub watch_time_secs: u64,
    /// The event's own instant, preserved for watch-time math only.
    pub at: DateTime<Utc>,
}
