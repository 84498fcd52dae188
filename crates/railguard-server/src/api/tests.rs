use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, state::AppState};

const OPERATOR_TOKEN: &str = "test-operator-token";

fn setup_app() -> (axum::Router, Arc<AppState>) {
    let mut config = Config::from_env();
    config.operator_token = OPERATOR_TOKEN.to_string();

    let state = Arc::new(AppState::new(config.clone()));
    let app = api::routes(&config).with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn operator_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seed_camera_and_train(app: &axum::Router) {
    let camera_res = app
        .clone()
        .oneshot(operator_post(
            "/v1/cameras",
            json!({
                "camera_id": "CAM-01",
                "location": { "lon": 77.210, "lat": 28.6140 },
                "railway_section": "NDLS-GZB"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(camera_res.status(), StatusCode::CREATED);

    let train_res = app
        .clone()
        .oneshot(operator_post(
            "/v1/trains",
            json!({
                "train_id": "T1",
                "name": "Shatabdi Express",
                "position": { "lon": 77.209, "lat": 28.6139 },
                "speed_kmh": 120.0,
                "max_speed_kmh": 120.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(train_res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn critical_alert_drives_advisory_to_20() {
    let (app, state) = setup_app();
    seed_camera_and_train(&app).await;

    let alert_res = app
        .clone()
        .oneshot(operator_post(
            "/v1/alerts",
            json!({
                "camera_id": "CAM-01",
                "severity": "critical",
                "category": "animal_persistent"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(alert_res.status(), StatusCode::CREATED);

    // Background loop is not running in tests; tick the cycle directly.
    state.run_evaluation_cycle(Utc::now());

    let advisory_res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/advisories/T1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(advisory_res.status(), StatusCode::OK);
    let advisory = read_json(advisory_res).await;
    assert_eq!(advisory["target_speed_kmh"], json!(20.0));
    assert_eq!(advisory["phase"], json!("speed_reducing"));
    assert_eq!(advisory["speed_band"], json!("full_stop"));
}

#[tokio::test]
async fn resolved_alerts_leave_train_at_max_speed() {
    let (app, state) = setup_app();
    seed_camera_and_train(&app).await;

    let alert_res = app
        .clone()
        .oneshot(operator_post(
            "/v1/alerts",
            json!({
                "camera_id": "CAM-01",
                "severity": "critical",
                "category": "emergency"
            }),
        ))
        .await
        .unwrap();
    let alert = read_json(alert_res).await;
    let alert_id = alert["id"].as_str().unwrap();

    let resolve_res = app
        .clone()
        .oneshot(operator_post(
            &format!("/v1/alerts/{alert_id}/resolve"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resolve_res.status(), StatusCode::OK);

    state.run_evaluation_cycle(Utc::now());

    let advisory = state.advisory_for("T1").unwrap();
    assert_eq!(advisory.target_speed_kmh, 120.0);
    assert!(advisory.alert_ids.is_empty());

    // Resolving again is a lifecycle violation.
    let again = app
        .clone()
        .oneshot(operator_post(
            &format!("/v1/alerts/{alert_id}/resolve"),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn alert_against_unknown_camera_is_404() {
    let (app, _state) = setup_app();

    let res = app
        .clone()
        .oneshot(operator_post(
            "/v1/alerts",
            json!({
                "camera_id": "CAM-MISSING",
                "severity": "low",
                "category": "animal_detected"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_position_report_is_400() {
    let (app, _state) = setup_app();
    seed_camera_and_train(&app).await;

    let res = app
        .clone()
        .oneshot(operator_post(
            "/v1/trains/T1/position",
            json!({
                "position": { "lon": 77.209, "lat": 123.456 },
                "speed_kmh": 80.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn operator_routes_reject_missing_or_bad_token() {
    let (app, _state) = setup_app();

    let body = json!({
        "camera_id": "CAM-01",
        "location": { "lon": 77.210, "lat": 28.6140 },
        "railway_section": "NDLS-GZB"
    });

    let missing = Request::builder()
        .method("POST")
        .uri("/v1/cameras")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.clone().oneshot(missing).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .method("POST")
        .uri("/v1/cameras")
        .header("content-type", "application/json")
        .header("authorization", "Bearer wrong-token")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.clone().oneshot(wrong).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn distance_endpoint_reports_km_and_eta() {
    let (app, _state) = setup_app();
    seed_camera_and_train(&app).await;

    let alert_res = app
        .clone()
        .oneshot(operator_post(
            "/v1/alerts",
            json!({
                "camera_id": "CAM-01",
                "severity": "medium",
                "category": "animal_detected"
            }),
        ))
        .await
        .unwrap();
    let alert = read_json(alert_res).await;
    let alert_id = alert["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/distance?train_id=T1&alert_id={alert_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let distance = body["distance_km"].as_f64().unwrap();
    assert!(distance > 0.0 && distance < 1.0, "got {distance}");
}

#[tokio::test]
async fn alert_list_filters_by_status() {
    let (app, _state) = setup_app();
    seed_camera_and_train(&app).await;

    for _ in 0..2 {
        app.clone()
            .oneshot(operator_post(
                "/v1/alerts",
                json!({
                    "camera_id": "CAM-01",
                    "severity": "low",
                    "category": "speed_reduction"
                }),
            ))
            .await
            .unwrap();
    }

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/alerts?status=active")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let alerts = read_json(res).await;
    assert_eq!(alerts.as_array().unwrap().len(), 2);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/alerts?status=resolved")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let alerts = read_json(res).await;
    assert!(alerts.as_array().unwrap().is_empty());
}
