//! Live-session introspection.

use axum::{extract::State, Json};

use sessions::ActiveCounts;

use crate::state::AppState;

/// GET /stats/active — current live counts across all dimensions.
pub async fn active_handler(State(state): State<AppState>) -> Json<ActiveCounts> {
    Json(state.manager.active_counts())
}
