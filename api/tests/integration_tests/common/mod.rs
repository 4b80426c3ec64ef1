//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup, HTTP request helpers, and a small exposition parser.

use api::{create_router, AppState, Config};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;

/// Push path used by the default configuration.
pub const PUSH_PATH: &str = "/domoticz-post";

/// Metrics path used by the default configuration.
pub const METRICS_PATH: &str = "/metrics";

/// Name of the liveness gauge.
pub const LAST_PUSH: &str = "domoticz_last_push_timestamp_seconds";

/// Creates a test router with a fresh store and the default configuration.
///
/// # Returns
///
/// A tuple containing the configured router and the app state.
pub fn test_app() -> (Router, AppState) {
    test_app_with_config(&Config::default())
}

/// Creates a test router with a fresh store and the given configuration.
pub fn test_app_with_config(config: &Config) -> (Router, AppState) {
    let (state, _worker) = AppState::from_config(config).unwrap();
    let router = create_router(state.clone(), config);
    (router, state)
}

/// Helper to make a POST request with a raw body.
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body
/// (`Value::Null` if the body is empty or not JSON).
pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}

/// Helper to POST a JSON report to the push path.
pub async fn push(app: Router, report: Value) -> StatusCode {
    let (status, _) = post_raw(app, PUSH_PATH, serde_json::to_string(&report).unwrap()).await;
    status
}

/// Helper to make a GET request.
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get_text(app, uri).await;
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Helper to make a GET request and return the body as text.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// A single sample line of a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Scraped {
    pub name: String,
    pub kind: String,
    pub value: f64,
}

/// Scrapes the metrics path and parses every unlabelled sample line.
pub async fn scrape(app: Router) -> Vec<Scraped> {
    let (status, body) = get_text(app, METRICS_PATH).await;
    assert_eq!(status, StatusCode::OK);
    parse_exposition(&body)
}

/// Parses `# TYPE` comments and `name value` lines of a text exposition.
pub fn parse_exposition(body: &str) -> Vec<Scraped> {
    let mut types = std::collections::HashMap::new();
    let mut scraped = Vec::new();

    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            let mut parts = rest.split_whitespace();
            if let (Some(name), Some(kind)) = (parts.next(), parts.next()) {
                types.insert(name.to_string(), kind.to_string());
            }
            continue;
        }
        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
            scraped.push(Scraped {
                name: name.to_string(),
                kind: types.get(name).cloned().unwrap_or_default(),
                value: value.parse().unwrap(),
            });
        }
    }

    scraped
}

/// Returns the value of the liveness gauge in a scrape.
pub fn last_push(scraped: &[Scraped]) -> f64 {
    scraped
        .iter()
        .find(|s| s.name == LAST_PUSH)
        .map(|s| s.value)
        .expect("liveness gauge missing from scrape")
}

/// Returns every per-sensor metric in a scrape.
pub fn sensors(scraped: &[Scraped]) -> Vec<&Scraped> {
    scraped.iter().filter(|s| s.name != LAST_PUSH).collect()
}
