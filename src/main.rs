//! stream-stats: streaming-session statistics engine.
//!
//! Ingests session lifecycle events from media origin servers over HTTP,
//! tracks the live-session view in memory, and condenses it into
//! per-minute multi-dimensional rows in MySQL. Startup order matters:
//! store, schema, recovery, workers, then the HTTP intake.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use aggregator::{restore_sessions, StatsScheduler, WorkerConfig};
use api::{router, AppState};
use mysql_store::{MySqlStore, StatsStore, StoreConfig};
use sessions::{SessionsManager, DEFAULT_DELTA_CAPACITY};
use telemetry::{health, init_tracing_from_env};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    db: StoreConfig,

    #[serde(default = "default_aggregation_interval")]
    aggregation_interval_seconds: u64,
    #[serde(default = "default_session_sync_interval")]
    session_sync_interval_seconds: u64,
    #[serde(default = "default_delta_buffer_capacity")]
    delta_buffer_capacity: usize,
    /// Snapshot rows older than this are discarded at recovery. Unset by
    /// default; operator's choice.
    #[serde(default)]
    stale_session_max_age_seconds: Option<u64>,
    #[serde(default = "default_shutdown_grace")]
    shutdown_grace_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_aggregation_interval() -> u64 {
    60
}

fn default_session_sync_interval() -> u64 {
    30
}

fn default_delta_buffer_capacity() -> usize {
    DEFAULT_DELTA_CAPACITY
}

fn default_shutdown_grace() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: StoreConfig::default(),
            aggregation_interval_seconds: default_aggregation_interval(),
            session_sync_interval_seconds: default_session_sync_interval(),
            delta_buffer_capacity: default_delta_buffer_capacity(),
            stale_session_max_age_seconds: None,
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting stream-stats v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    // Connect to the store; unreachable MySQL at startup is fatal.
    let store = Arc::new(
        MySqlStore::connect(config.db.clone())
            .await
            .context("Failed to connect to MySQL")?,
    );
    mysql_store::health::init_schema(&store)
        .await
        .context("Failed to initialize MySQL schema")?;

    if mysql_store::health::check_connection(&store).await {
        health().store.set_healthy();
        info!("MySQL connection: healthy");
    } else {
        health().store.set_unhealthy("Connection check failed");
        error!("MySQL connection: unhealthy");
    }

    let manager = Arc::new(SessionsManager::new(config.delta_buffer_capacity));

    // Recovery must complete before the webhook intake is enabled.
    let stale_after = config
        .stale_session_max_age_seconds
        .map(|secs| chrono::Duration::seconds(secs as i64));
    let store_dyn: Arc<dyn StatsStore> = store.clone();
    restore_sessions(&manager, store_dyn.as_ref(), stale_after)
        .await
        .context("Failed to recover active sessions")?;

    // Background workers: minute aggregation and session snapshotting.
    let worker_config = WorkerConfig {
        aggregation_interval: Duration::from_secs(config.aggregation_interval_seconds.max(1)),
        snapshot_interval: Duration::from_secs(config.session_sync_interval_seconds.max(1)),
        ..WorkerConfig::default()
    };
    let scheduler = Arc::new(StatsScheduler::new(
        worker_config,
        manager.clone(),
        store_dyn.clone(),
    ));
    let worker_handles = scheduler.clone().start();

    let state = AppState::new(manager.clone());
    state.set_ready();
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{addr}");

    // Run the server; a termination signal stops the listener, then
    // in-flight requests get a bounded grace period to finish.
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutting down...");
    let _ = stop_tx.send(());

    let grace = Duration::from_secs(config.shutdown_grace_seconds);
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!("Server error during shutdown: {e}"),
        Ok(Err(e)) => error!("Server task panicked: {e}"),
        Err(_) => warn!("Shutdown grace period expired; dropping in-flight requests"),
    }

    for handle in &worker_handles {
        handle.abort();
    }

    // Final flush of the in-progress minute and one last snapshot; restart
    // correctness depends on the snapshot, not on mid-minute aggregation.
    scheduler.final_flush().await;
    scheduler.snapshot_once().await;
    store.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from defaults, optional config file, and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .prefix("STREAM")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat env overrides for the nested store config; the config crate's
    // nested parsing does not play well with underscored field names.
    if let Ok(host) = std::env::var("STREAM_DB_HOST") {
        config.db.host = host;
    }
    if let Ok(port) = std::env::var("STREAM_DB_PORT") {
        config.db.port = port
            .parse()
            .context("STREAM_DB_PORT must be a port number")?;
    }
    if let Ok(user) = std::env::var("STREAM_DB_USER") {
        config.db.user = user;
    }
    if let Ok(password) = std::env::var("STREAM_DB_PASSWORD") {
        config.db.password = password;
    }
    if let Ok(name) = std::env::var("STREAM_DB_NAME") {
        config.db.database = name;
    }
    if let Ok(size) = std::env::var("STREAM_DB_POOL_SIZE") {
        config.db.pool_size = size
            .parse()
            .context("STREAM_DB_POOL_SIZE must be an integer")?;
    }
    if let Ok(overflow) = std::env::var("STREAM_DB_POOL_OVERFLOW") {
        config.db.pool_overflow = overflow
            .parse()
            .context("STREAM_DB_POOL_OVERFLOW must be an integer")?;
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
