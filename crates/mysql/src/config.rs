//! MySQL store configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the stats database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Base connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Extra connections allowed beyond the base pool size.
    #[serde(default = "default_pool_overflow")]
    pub pool_overflow: u32,
    /// Seconds to wait for a connection before failing.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "stream_stats".to_string()
}

fn default_database() -> String {
    "stream_stats".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_pool_overflow() -> u32 {
    20
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
            pool_size: default_pool_size(),
            pool_overflow: default_pool_overflow(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Connection URL, without logging the password anywhere.
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    /// Maximum pool connections (base size plus overflow).
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.pool_overflow).max(1)
    }
}
