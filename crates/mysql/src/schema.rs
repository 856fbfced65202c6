//! Table DDL.
//!
//! Six per-minute stats tables (global plus five breakdowns, each keyed by
//! the minute and its dimension column) and the `active_sessions` snapshot
//! table keyed by session id.

pub const CREATE_STATS_GLOBAL: &str = r#"
CREATE TABLE IF NOT EXISTS stats_global (
    minute DATETIME NOT NULL,
    sessions_started INT UNSIGNED NOT NULL DEFAULT 0,
    sessions_closed INT UNSIGNED NOT NULL DEFAULT 0,
    total_bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    bandwidth_bps BIGINT UNSIGNED NOT NULL DEFAULT 0,
    watch_time_seconds BIGINT UNSIGNED NOT NULL DEFAULT 0,
    unique_users INT UNSIGNED NOT NULL DEFAULT 0,
    peak_concurrent INT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (minute)
)
"#;

pub const CREATE_STATS_BY_SERVER: &str = r#"
CREATE TABLE IF NOT EXISTS stats_by_server (
    minute DATETIME NOT NULL,
    server VARCHAR(100) NOT NULL,
    sessions_started INT UNSIGNED NOT NULL DEFAULT 0,
    sessions_closed INT UNSIGNED NOT NULL DEFAULT 0,
    total_bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    bandwidth_bps BIGINT UNSIGNED NOT NULL DEFAULT 0,
    watch_time_seconds BIGINT UNSIGNED NOT NULL DEFAULT 0,
    unique_users INT UNSIGNED NOT NULL DEFAULT 0,
    peak_concurrent INT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (minute, server)
)
"#;

pub const CREATE_STATS_BY_CHANNEL: &str = r#"
CREATE TABLE IF NOT EXISTS stats_by_channel (
    minute DATETIME NOT NULL,
    channel VARCHAR(100) NOT NULL,
    sessions_started INT UNSIGNED NOT NULL DEFAULT 0,
    sessions_closed INT UNSIGNED NOT NULL DEFAULT 0,
    total_bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    bandwidth_bps BIGINT UNSIGNED NOT NULL DEFAULT 0,
    watch_time_seconds BIGINT UNSIGNED NOT NULL DEFAULT 0,
    unique_users INT UNSIGNED NOT NULL DEFAULT 0,
    peak_concurrent INT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (minute, channel)
)
"#;

pub const CREATE_STATS_BY_COUNTRY: &str = r#"
CREATE TABLE IF NOT EXISTS stats_by_country (
    minute DATETIME NOT NULL,
    country VARCHAR(10) NOT NULL,
    sessions_started INT UNSIGNED NOT NULL DEFAULT 0,
    sessions_closed INT UNSIGNED NOT NULL DEFAULT 0,
    total_bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    bandwidth_bps BIGINT UNSIGNED NOT NULL DEFAULT 0,
    watch_time_seconds BIGINT UNSIGNED NOT NULL DEFAULT 0,
    unique_users INT UNSIGNED NOT NULL DEFAULT 0,
    peak_concurrent INT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (minute, country)
)
"#;

pub const CREATE_STATS_BY_PROTOCOL: &str = r#"
CREATE TABLE IF NOT EXISTS stats_by_protocol (
    minute DATETIME NOT NULL,
    protocol VARCHAR(20) NOT NULL,
    sessions_started INT UNSIGNED NOT NULL DEFAULT 0,
    sessions_closed INT UNSIGNED NOT NULL DEFAULT 0,
    total_bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    bandwidth_bps BIGINT UNSIGNED NOT NULL DEFAULT 0,
    watch_time_seconds BIGINT UNSIGNED NOT NULL DEFAULT 0,
    unique_users INT UNSIGNED NOT NULL DEFAULT 0,
    peak_concurrent INT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (minute, protocol)
)
"#;

pub const CREATE_STATS_BY_USER_AGENT: &str = r#"
CREATE TABLE IF NOT EXISTS stats_by_user_agent (
    minute DATETIME NOT NULL,
    user_agent_class VARCHAR(20) NOT NULL,
    sessions_started INT UNSIGNED NOT NULL DEFAULT 0,
    sessions_closed INT UNSIGNED NOT NULL DEFAULT 0,
    total_bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    bandwidth_bps BIGINT UNSIGNED NOT NULL DEFAULT 0,
    watch_time_seconds BIGINT UNSIGNED NOT NULL DEFAULT 0,
    unique_users INT UNSIGNED NOT NULL DEFAULT 0,
    peak_concurrent INT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (minute, user_agent_class)
)
"#;

pub const CREATE_ACTIVE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS active_sessions (
    id VARCHAR(128) NOT NULL,
    server VARCHAR(100) NOT NULL,
    channel VARCHAR(100) NOT NULL,
    country VARCHAR(10) NOT NULL DEFAULT '',
    protocol VARCHAR(20) NOT NULL DEFAULT '',
    user_agent VARCHAR(512) NOT NULL DEFAULT '',
    user_agent_class VARCHAR(20) NOT NULL DEFAULT 'other',
    user_id VARCHAR(100) NOT NULL DEFAULT '',
    ip VARCHAR(45) NOT NULL DEFAULT '',
    opened_at BIGINT NOT NULL,
    last_seen_at DATETIME NOT NULL,
    bytes BIGINT UNSIGNED NOT NULL DEFAULT 0,
    PRIMARY KEY (id)
)
"#;

/// All DDL statements, in creation order.
pub fn all_tables() -> [&'static str; 7] {
    [
        CREATE_STATS_GLOBAL,
        CREATE_STATS_BY_SERVER,
        CREATE_STATS_BY_CHANNEL,
        CREATE_STATS_BY_COUNTRY,
        CREATE_STATS_BY_PROTOCOL,
        CREATE_STATS_BY_USER_AGENT,
        CREATE_ACTIVE_SESSIONS,
    ]
}
