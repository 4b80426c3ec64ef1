//! Integration tests for Prometheus scrapes.
//!
//! Tests cover:
//! - The end-to-end push then scrape scenario
//! - Expiry of samples that stop being pushed, with and without a sweep
//! - Monotonicity of the liveness gauge

use api::Config;
use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;

use super::common::{
    get_text, last_push, push, scrape, sensors, test_app, test_app_with_config, METRICS_PATH,
};

fn short_lived_config(sweep_interval_secs: u64) -> Config {
    Config {
        staleness_window_secs: 1,
        sweep_interval_secs,
        ..Config::default()
    }
}

#[tokio::test]
#[allow(clippy::float_cmp)]
async fn test_push_then_scrape() {
    let (app, _state) = test_app();

    let status = push(
        app.clone(),
        json!({"id": 5, "type": "counter", "sType": "energy", "name": "kWh", "value": 12.3, "unit": "kWh"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_text(app, METRICS_PATH).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(
        "# HELP domoticz_5_counter_energy Domoticz exporter: Type: 'counter' Dstype: 'energy' Dsname: 'kWh' Unit: 'kWh'"
    ));

    let scraped = super::common::parse_exposition(&body);
    let sensors = sensors(&scraped);
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].name, "domoticz_5_counter_energy");
    assert_eq!(sensors[0].kind, "counter");
    assert_eq!(sensors[0].value, 12.3);

    let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    let liveness = last_push(&scraped);
    assert!(liveness > 0.0);
    assert!((now - liveness).abs() < 60.0);
}

#[tokio::test]
#[allow(clippy::float_cmp)]
async fn test_scrape_without_pushes_emits_only_liveness() {
    let (app, _state) = test_app();

    let scraped = scrape(app).await;

    assert_eq!(scraped.len(), 1);
    assert_eq!(last_push(&scraped), 0.0);
}

#[tokio::test]
async fn test_expired_sample_hidden_before_sweep() {
    // Sweep far in the future: only the scrape-time filter can hide the sample.
    let (app, state) = test_app_with_config(&short_lived_config(3600));

    push(
        app.clone(),
        json!({"id": 8, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 19.0}),
    )
    .await;
    assert_eq!(sensors(&scrape(app.clone()).await).len(), 1);

    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(sensors(&scrape(app).await).is_empty());
    assert_eq!(state.store().len(), 1);
}

#[tokio::test]
async fn test_expired_sample_removed_by_sweep() {
    let (app, state) = test_app_with_config(&short_lived_config(1));

    push(
        app.clone(),
        json!({"id": 9, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 19.0}),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert!(state.store().is_empty());
    assert!(sensors(&scrape(app).await).is_empty());
}

#[tokio::test]
async fn test_liveness_is_monotonic() {
    let (app, _state) = test_app();

    let initial = last_push(&scrape(app.clone()).await);

    push(
        app.clone(),
        json!({"id": 1, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 1.0}),
    )
    .await;
    let first = last_push(&scrape(app.clone()).await);
    assert!(first > initial);

    let repeated = last_push(&scrape(app.clone()).await);
    assert!(repeated >= first);

    tokio::time::sleep(Duration::from_millis(10)).await;
    push(
        app.clone(),
        json!({"id": 2, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 2.0}),
    )
    .await;
    let second = last_push(&scrape(app).await);
    assert!(second > first);
}

#[tokio::test]
async fn test_malformed_push_does_not_touch_liveness() {
    let (app, _state) = test_app();

    push(
        app.clone(),
        json!({"id": 1, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 1.0}),
    )
    .await;
    let before = last_push(&scrape(app.clone()).await);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let status = push(app.clone(), json!({"id": "one"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let after = last_push(&scrape(app).await);
    assert!((after - before).abs() < f64::EPSILON);
}
