//! MySQL client and the production [`StatsStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions};
use sqlx::QueryBuilder;
use tracing::{debug, info};

use stats_core::{Dimension, Error, Result};

use crate::config::StoreConfig;
use crate::rows::{SessionRow, StatsRow};
use crate::store::StatsStore;

/// The metric columns shared by every stats table.
const STAT_COLUMNS: &str = "sessions_started, sessions_closed, total_bytes, bandwidth_bps, \
     watch_time_seconds, unique_users, peak_concurrent";

const STAT_UPDATES: &str = "sessions_started = VALUES(sessions_started), \
     sessions_closed = VALUES(sessions_closed), \
     total_bytes = VALUES(total_bytes), \
     bandwidth_bps = VALUES(bandwidth_bps), \
     watch_time_seconds = VALUES(watch_time_seconds), \
     unique_users = VALUES(unique_users), \
     peak_concurrent = VALUES(peak_concurrent)";

/// MySQL-backed store with a shared connection pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    config: StoreConfig,
}

impl MySqlStore {
    /// Connect and build the pool; fails fast when the database is
    /// unreachable so startup can exit non-zero.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url())
            .await
            .map_err(|e| {
                Error::store(format!(
                    "connect to mysql://{}:{}/{}: {e}",
                    config.host, config.port, config.database
                ))
            })?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections(),
            "Connected to MySQL"
        );

        Ok(Self { pool, config })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StatsStore for MySqlStore {
    async fn upsert_stats(
        &self,
        minute: DateTime<Utc>,
        dimension: Dimension,
        rows: &[StatsRow],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let table = dimension.table();
        let mut query: QueryBuilder<MySql> = match dimension.value_column() {
            Some(column) => {
                QueryBuilder::new(format!("INSERT INTO {table} (minute, {column}, {STAT_COLUMNS}) "))
            }
            None => QueryBuilder::new(format!("INSERT INTO {table} (minute, {STAT_COLUMNS}) ")),
        };

        let keyed = dimension.value_column().is_some();
        query.push_values(rows, |mut b, row| {
            b.push_bind(minute);
            if keyed {
                b.push_bind(&row.dimension_value);
            }
            b.push_bind(row.sessions_started);
            b.push_bind(row.sessions_closed);
            b.push_bind(row.total_bytes);
            b.push_bind(row.bandwidth_bps);
            b.push_bind(row.watch_time_seconds);
            b.push_bind(row.unique_users);
            b.push_bind(row.peak_concurrent);
        });
        query.push(format!(" ON DUPLICATE KEY UPDATE {STAT_UPDATES}"));

        query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| Error::store(format!("upsert into {table}: {e}")))?;

        debug!(table, rows = rows.len(), "Upserted minute rows");
        Ok(())
    }

    async fn sync_active_sessions(&self, rows: &[SessionRow]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::store(format!("begin session sync: {e}")))?;

        if rows.is_empty() {
            sqlx::query("DELETE FROM active_sessions")
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::store(format!("clear active_sessions: {e}")))?;
        } else {
            let mut upsert: QueryBuilder<MySql> = QueryBuilder::new(
                "INSERT INTO active_sessions (id, server, channel, country, protocol, \
                 user_agent, user_agent_class, user_id, ip, opened_at, last_seen_at, bytes) ",
            );
            upsert.push_values(rows, |mut b, row| {
                b.push_bind(&row.id);
                b.push_bind(&row.server);
                b.push_bind(&row.channel);
                b.push_bind(&row.country);
                b.push_bind(&row.protocol);
                b.push_bind(&row.user_agent);
                b.push_bind(&row.user_agent_class);
                b.push_bind(&row.user_id);
                b.push_bind(&row.ip);
                b.push_bind(row.opened_at);
                b.push_bind(row.last_seen_at);
                b.push_bind(row.bytes);
            });
            upsert.push(
                " ON DUPLICATE KEY UPDATE server = VALUES(server), channel = VALUES(channel), \
                 country = VALUES(country), protocol = VALUES(protocol), \
                 user_agent = VALUES(user_agent), user_agent_class = VALUES(user_agent_class), \
                 user_id = VALUES(user_id), ip = VALUES(ip), opened_at = VALUES(opened_at), \
                 last_seen_at = VALUES(last_seen_at), bytes = VALUES(bytes)",
            );
            upsert
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::store(format!("upsert active_sessions: {e}")))?;

            // Phase two: drop sessions that have since closed.
            let mut delete: QueryBuilder<MySql> =
                QueryBuilder::new("DELETE FROM active_sessions WHERE id NOT IN (");
            let mut ids = delete.separated(", ");
            for row in rows {
                ids.push_bind(&row.id);
            }
            delete.push(")");
            delete
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::store(format!("prune active_sessions: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::store(format!("commit session sync: {e}")))?;

        debug!(rows = rows.len(), "Synced active sessions");
        Ok(())
    }

    async fn load_active_sessions(&self) -> Result<Vec<SessionRow>> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT id, server, channel, country, protocol, user_agent, user_agent_class, \
             user_id, ip, opened_at, last_seen_at, bytes FROM active_sessions",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::store(format!("load active_sessions: {e}")))
    }
}
