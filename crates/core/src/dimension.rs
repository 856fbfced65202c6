//! The six aggregation dimensions.

use serde::{Deserialize, Serialize};

/// One of the six per-minute breakdowns.
///
/// `Global` aggregates everything in the minute; the other five group by a
/// single attribute of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Global,
    Server,
    Channel,
    Country,
    Protocol,
    UserAgentClass,
}

impl Dimension {
    /// The five non-global breakdowns.
    pub const BREAKDOWNS: [Dimension; 5] = [
        Self::Server,
        Self::Channel,
        Self::Country,
        Self::Protocol,
        Self::UserAgentClass,
    ];

    /// Target table for this dimension's per-minute rows.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Global => "stats_global",
            Self::Server => "stats_by_server",
            Self::Channel => "stats_by_channel",
            Self::Country => "stats_by_country",
            Self::Protocol => "stats_by_protocol",
            Self::UserAgentClass => "stats_by_user_agent",
        }
    }

    /// The dimension-value column, part of the primary key on breakdown
    /// tables. `Global` has none; its primary key is the minute alone.
    pub fn value_column(&self) -> Option<&'static str> {
        match self {
            Self::Global => None,
            Self::Server => Some("server"),
            Self::Channel => Some("channel"),
            Self::Country => Some("country"),
            Self::Protocol => Some("protocol"),
            Self::UserAgentClass => Some("user_agent_class"),
        }
    }
}
