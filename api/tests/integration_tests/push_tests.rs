//! Integration tests for Domoticz pushes.
//!
//! Tests cover:
//! - Replacing a sample by pushing the same id again
//! - Rejection of malformed payloads without side effects
//! - Concurrent pushes to distinct ids

use axum::http::StatusCode;
use serde_json::json;

use super::common::{post_raw, push, scrape, sensors, test_app, PUSH_PATH};

#[tokio::test]
#[allow(clippy::float_cmp)]
async fn test_same_id_is_replaced() {
    let (app, state) = test_app();

    let status = push(
        app.clone(),
        json!({"id": 12, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 20.5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first_expiry = state.store().snapshot_all()[0].expiry;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let status = push(
        app.clone(),
        json!({"id": 12, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": 21.5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let snapshot = state.store().snapshot_all();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].value, 21.5);
    assert!(snapshot[0].expiry > first_expiry);

    let scraped = scrape(app).await;
    let sensors = sensors(&scraped);
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].value, 21.5);
}

#[tokio::test]
async fn test_type_change_overwrites_kind() {
    let (app, _state) = test_app();

    push(
        app.clone(),
        json!({"id": 4, "type": "counter", "sType": "energy", "name": "kWh", "value": 1.0}),
    )
    .await;
    push(
        app.clone(),
        json!({"id": 4, "type": "Usage", "sType": "energy", "name": "kWh", "value": 2.0}),
    )
    .await;

    let scraped = scrape(app).await;
    let sensors = sensors(&scraped);
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].name, "domoticz_4_Usage_energy");
    assert_eq!(sensors[0].kind, "gauge");
}

#[tokio::test]
async fn test_malformed_push_has_no_visible_effect() {
    let (app, state) = test_app();

    let before = scrape(app.clone()).await;

    let (status, response) = post_raw(app.clone(), PUSH_PATH, "{\"id\": 1, \"type\":").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "invalid_json");

    let (status, _) = post_raw(
        app.clone(),
        PUSH_PATH,
        r#"{"id": 1, "type": "Temp", "sType": "x", "name": "t"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_raw(app.clone(), PUSH_PATH, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let after = scrape(app).await;
    assert_eq!(before, after);
    assert!(state.store().is_empty());
}

#[tokio::test]
async fn test_concurrent_pushes_to_distinct_ids() {
    const PUSHES: u32 = 64;
    let (app, _state) = test_app();

    let tasks: Vec<_> = (0..PUSHES)
        .map(|id| {
            let app = app.clone();
            tokio::spawn(async move {
                push(
                    app,
                    json!({"id": id, "type": "Temp", "sType": "LaCrosse", "name": "temp", "value": id}),
                )
                .await
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let scraped = scrape(app).await;
    let mut names: Vec<_> = sensors(&scraped).iter().map(|s| s.name.clone()).collect();
    assert_eq!(names.len(), PUSHES as usize);
    names.sort();
    names.dedup();
    assert_eq!(names.len(), PUSHES as usize);
}
