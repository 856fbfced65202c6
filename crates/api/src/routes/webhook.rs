//! Webhook intake handler.

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use tracing::{debug, info};
use uuid::Uuid;

use stats_core::{validate_batch, StreamEvent};
use telemetry::metrics;

use crate::response::{ApiError, WebhookResponse};
use crate::state::AppState;

/// POST /api/webhook — event intake from origin servers.
///
/// The body is a JSON array of events; a bare object is treated as a
/// one-element batch. Malformed JSON and schema-invalid events fail the
/// whole request with 400 and never reach the sessions manager. Manager
/// rejections (duplicates, unknown closes) are surfaced only as a count.
pub async fn webhook_handler(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Json(value) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let events: Vec<StreamEvent> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| ApiError::bad_request(format!("invalid event: {e}")))?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(value)
            .map_err(|e| ApiError::bad_request(format!("invalid event: {e}")))?],
        _ => return Err(ApiError::bad_request("expected an event object or array")),
    };

    let batch_id = Uuid::new_v4();
    metrics().batches_received.inc();
    metrics().events_received.inc_by(events.len() as u64);

    validate_batch(&events).map_err(|e| {
        metrics().events_invalid.inc();
        debug!(batch_id = %batch_id, error = %e, "Batch failed validation");
        ApiError::bad_request(e.to_string())
    })?;

    let mut rejected = 0;
    for event in &events {
        if state.manager.ingest(event).is_rejected() {
            rejected += 1;
        }
    }

    info!(
        batch_id = %batch_id,
        events = events.len(),
        rejected,
        "Batch ingested"
    );

    Ok(Json(WebhookResponse::ok(events.len(), rejected)))
}
