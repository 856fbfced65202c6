//! API routes.

pub mod health;
pub mod stats;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/webhook", post(webhook::webhook_handler))
        .route("/health", get(health::health_handler))
        .route("/stats/active", get(stats::active_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
