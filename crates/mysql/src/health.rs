//! MySQL health checks and schema initialization.

use tracing::{debug, error};

use stats_core::{Error, Result};

use crate::client::MySqlStore;
use crate::schema::all_tables;

/// Check store connectivity.
pub async fn check_connection(store: &MySqlStore) -> bool {
    match sqlx::query("SELECT 1").execute(store.pool()).await {
        Ok(_) => {
            debug!("MySQL connection healthy");
            true
        }
        Err(e) => {
            error!("MySQL health check failed: {e}");
            false
        }
    }
}

/// Create all tables that do not exist yet.
pub async fn init_schema(store: &MySqlStore) -> Result<()> {
    for ddl in all_tables() {
        sqlx::query(ddl)
            .execute(store.pool())
            .await
            .map_err(|e| Error::store(format!("execute DDL: {e}")))?;
    }

    debug!("MySQL schema initialized");
    Ok(())
}
