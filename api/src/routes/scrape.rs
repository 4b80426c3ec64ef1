//! Prometheus scrape endpoint.

use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};

/// Creates the scrape route mounted at `path`.
pub fn scrape_routes(state: AppState, path: &str) -> Router {
    Router::new()
        .route(path, get(scrape_metrics))
        .with_state(state)
}

/// Renders the registry in the Prometheus text exposition format.
async fn scrape_metrics(State(state): State<AppState>) -> Response {
    let families = state.registry().gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
