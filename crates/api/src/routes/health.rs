//! Health check endpoint.

use axum::{extract::State, Json};

use crate::response::{ApiError, HealthResponse};
use crate::state::AppState;

/// GET /health — 200 once recovery has completed, 503 before.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    if state.is_ready() {
        Ok(Json(HealthResponse::ok()))
    } else {
        Err(ApiError::service_unavailable("recovery in progress"))
    }
}
