//! Domoticz push endpoint.
//!
//! Accepts one JSON report per request, names it, and hands the resulting sample
//! to the update worker. The request completes once the worker has applied it.

use crate::state::AppState;
use crate::worker::IngestError;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Report, Sample};

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PushError {
    pub error: String,
    pub message: String,
}

/// Creates the push route mounted at `path`.
pub fn push_routes(state: AppState, path: &str) -> Router {
    Router::new()
        .route(path, post(ingest_report))
        .with_state(state)
}

fn bad_request(error: &str, message: String) -> (StatusCode, Json<PushError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(PushError {
            error: error.to_string(),
            message,
        }),
    )
}

// The body is decoded by hand: Domoticz does not reliably send a JSON content type,
// and every unreadable or undecodable body, oversized ones included, maps to 400.
async fn ingest_report(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, (StatusCode, Json<PushError>)> {
    let body = body.map_err(|e| {
        tracing::warn!(status = %e.status(), error = %e.body_text(), "Error reading Domoticz push");
        bad_request("invalid_body", e.body_text())
    })?;

    let report: Report = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Error decoding Domoticz push");
        bad_request("invalid_json", e.to_string())
    })?;

    let now = Utc::now();
    state.last_push().mark(now);

    let identity = state.naming().identify(&report);
    let expiry = now
        .checked_add_signed(state.expiry_horizon())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let sample = Sample::new(report.id, identity, report.value, expiry);

    tracing::debug!(
        sensor_id = report.id,
        metric = %sample.name,
        kind = %sample.kind,
        value = report.value,
        "Received Domoticz push"
    );

    state.updates().submit(sample).await.map_err(|e| {
        tracing::error!(sensor_id = report.id, error = %e, "Failed to apply Domoticz push");
        let error = match e {
            IngestError::WorkerUnavailable => "worker_unavailable",
            IngestError::Timeout(_) => "push_timeout",
        };
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PushError {
                error: error.to_string(),
                message: e.to_string(),
            }),
        )
    })?;

    Ok(StatusCode::OK)
}
