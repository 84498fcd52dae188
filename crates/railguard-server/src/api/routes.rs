//! REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::auth::{self, OperatorToken};
use crate::config::Config;
use crate::state::{AppState, StoreError};
use railguard_core::{
    Acknowledgement, AlertCategory, AlertSeverity, AlertStatus, Camera, CameraStatus, Coordinate,
    PositionReport,
};

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let operator_token = OperatorToken(Arc::new(config.operator_token.clone()));

    let public_routes = Router::new()
        .route("/v1/cameras", get(list_cameras))
        .route("/v1/cameras/:camera_id", get(get_camera))
        .route("/v1/alerts", get(list_alerts))
        .route("/v1/alerts/:alert_id", get(get_alert))
        .route("/v1/trains", get(list_trains))
        .route("/v1/trains/:train_id", get(get_train))
        .route("/v1/advisories", get(list_advisories))
        .route("/v1/advisories/:train_id", get(get_advisory))
        .route("/v1/distance", get(get_distance));

    let operator_routes = Router::new()
        .route("/v1/cameras", post(register_camera))
        .route("/v1/alerts", post(raise_alert))
        .route("/v1/alerts/:alert_id/acknowledge", post(acknowledge_alert))
        .route("/v1/alerts/:alert_id/resolve", post(resolve_alert))
        .route("/v1/alerts/:alert_id/false-alarm", post(false_alarm_alert))
        .route("/v1/trains", post(register_train))
        .route("/v1/trains/:train_id/position", post(report_position))
        .layer(middleware::from_fn_with_state(
            operator_token,
            auth::require_operator,
        ));

    public_routes.merge(operator_routes)
}

fn error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::CameraNotFound(_)
        | StoreError::AlertNotFound(_)
        | StoreError::TrainNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::CameraExists(_) | StoreError::TrainExists(_) | StoreError::Lifecycle(_) => {
            StatusCode::CONFLICT
        }
        StoreError::InvalidCoordinate => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

// ---- cameras ----

#[derive(Debug, Deserialize)]
struct RegisterCameraRequest {
    camera_id: String,
    location: Coordinate,
    railway_section: String,
    #[serde(default)]
    nearest_station: Option<String>,
    #[serde(default)]
    status: CameraStatus,
}

async fn register_camera(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterCameraRequest>,
) -> Response {
    let camera = Camera {
        camera_id: req.camera_id,
        location: req.location,
        railway_section: req.railway_section,
        nearest_station: req.nearest_station,
        status: req.status,
        created_at: Utc::now(),
    };
    match state.register_camera(camera) {
        Ok(camera) => (StatusCode::CREATED, Json(camera)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_cameras(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.list_cameras())
}

async fn get_camera(
    State(state): State<Arc<AppState>>,
    Path(camera_id): Path<String>,
) -> Response {
    match state.get_camera(&camera_id) {
        Some(camera) => Json(camera).into_response(),
        None => error_response(StoreError::CameraNotFound(camera_id)),
    }
}

// ---- alerts ----

#[derive(Debug, Deserialize)]
struct RaiseAlertRequest {
    camera_id: String,
    severity: AlertSeverity,
    category: AlertCategory,
    #[serde(default)]
    notes: Option<String>,
}

async fn raise_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RaiseAlertRequest>,
) -> Response {
    match state.raise_alert(&req.camera_id, req.severity, req.category, req.notes) {
        Ok(alert) => {
            tracing::info!(
                alert_id = %alert.id,
                camera_id = %alert.camera_id,
                severity = ?alert.severity,
                "alert raised"
            );
            (StatusCode::CREATED, Json(alert)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct ListAlertsQuery {
    status: Option<AlertStatus>,
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAlertsQuery>,
) -> impl IntoResponse {
    Json(state.list_alerts(query.status))
}

async fn get_alert(State(state): State<Arc<AppState>>, Path(alert_id): Path<String>) -> Response {
    match state.get_alert(&alert_id) {
        Some(alert) => Json(alert).into_response(),
        None => error_response(StoreError::AlertNotFound(alert_id)),
    }
}

#[derive(Debug, Deserialize)]
struct AcknowledgeRequest {
    operator_id: String,
    operator_name: String,
}

async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
    Json(req): Json<AcknowledgeRequest>,
) -> Response {
    let by = Acknowledgement {
        operator_id: req.operator_id,
        operator_name: req.operator_name,
        timestamp: Utc::now(),
    };
    match state.acknowledge_alert(&alert_id, by) {
        Ok(alert) => Json(alert).into_response(),
        Err(err) => error_response(err),
    }
}

async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> Response {
    match state.resolve_alert(&alert_id) {
        Ok(alert) => Json(alert).into_response(),
        Err(err) => error_response(err),
    }
}

async fn false_alarm_alert(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> Response {
    match state.false_alarm_alert(&alert_id) {
        Ok(alert) => Json(alert).into_response(),
        Err(err) => error_response(err),
    }
}

// ---- trains ----

#[derive(Debug, Deserialize)]
struct RegisterTrainRequest {
    train_id: String,
    name: String,
    position: Coordinate,
    #[serde(default)]
    speed_kmh: f64,
    #[serde(default)]
    max_speed_kmh: Option<f64>,
}

async fn register_train(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterTrainRequest>,
) -> Response {
    let report = PositionReport {
        train_id: req.train_id,
        position: req.position,
        speed_kmh: req.speed_kmh,
        timestamp: Utc::now(),
    };
    match state.register_train(&report, &req.name, req.max_speed_kmh) {
        Ok(train) => (StatusCode::CREATED, Json(train)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_trains(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.list_trains())
}

async fn get_train(State(state): State<Arc<AppState>>, Path(train_id): Path<String>) -> Response {
    match state.get_train(&train_id) {
        Some(train) => Json(train).into_response(),
        None => error_response(StoreError::TrainNotFound(train_id)),
    }
}

#[derive(Debug, Deserialize)]
struct ReportPositionRequest {
    position: Coordinate,
    #[serde(default)]
    speed_kmh: f64,
}

async fn report_position(
    State(state): State<Arc<AppState>>,
    Path(train_id): Path<String>,
    Json(req): Json<ReportPositionRequest>,
) -> Response {
    let report = PositionReport {
        train_id,
        position: req.position,
        speed_kmh: req.speed_kmh,
        timestamp: Utc::now(),
    };
    match state.apply_position(&report) {
        Ok(train) => (StatusCode::ACCEPTED, Json(train)).into_response(),
        Err(err) => error_response(err),
    }
}

// ---- advisories ----

async fn list_advisories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.list_advisories())
}

async fn get_advisory(
    State(state): State<Arc<AppState>>,
    Path(train_id): Path<String>,
) -> Response {
    match state.advisory_for(&train_id) {
        Some(advisory) => Json(advisory).into_response(),
        None => error_response(StoreError::TrainNotFound(train_id)),
    }
}

#[derive(Debug, Deserialize)]
struct DistanceQuery {
    train_id: String,
    alert_id: String,
}

async fn get_distance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DistanceQuery>,
) -> Response {
    match state.distance_to_alert(&query.train_id, &query.alert_id) {
        Ok((distance_km, eta_minutes)) => Json(json!({
            "distance_km": (distance_km * 100.0).round() / 100.0,
            "estimated_arrival_minutes": eta_minutes.round(),
        }))
        .into_response(),
        Err(err) => error_response(err),
    }
}
