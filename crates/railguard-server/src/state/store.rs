//! In-memory state store using DashMap.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use railguard_core::{
    advisory, Acknowledgement, AlertCategory, AlertSeverity, AlertStatus, Camera, HazardAlert,
    LifecycleError, PositionReport, SpeedTracker, TrackerPhase, Train, TrainStatus,
};

use crate::config::Config;

/// Errors surfaced by store operations, mapped to HTTP statuses in the API.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("camera {0} not found")]
    CameraNotFound(String),
    #[error("alert {0} not found")]
    AlertNotFound(String),
    #[error("train {0} not found")]
    TrainNotFound(String),
    #[error("train {0} already registered")]
    TrainExists(String),
    #[error("camera {0} already registered")]
    CameraExists(String),
    #[error("invalid coordinate")]
    InvalidCoordinate,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Latest advisory computed for a train by the background loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainAdvisory {
    pub train_id: String,
    pub target_speed_kmh: f64,
    /// Speed the tracker has converged the advisory to so far.
    pub advised_speed_kmh: f64,
    pub phase: TrackerPhase,
    pub speed_band: advisory::SpeedBand,
    pub nearest_distance_km: Option<f64>,
    pub alert_ids: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

/// Application state - thread-safe store for cameras, alerts, trains and
/// their advisories.
pub struct AppState {
    config: Config,
    cameras: DashMap<String, Camera>,
    alerts: DashMap<String, HazardAlert>,
    trains: DashMap<String, Train>,
    trackers: DashMap<String, SpeedTracker>,
    advisories: DashMap<String, TrainAdvisory>,
    evaluation_cycles: AtomicU64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cameras: DashMap::new(),
            alerts: DashMap::new(),
            trains: DashMap::new(),
            trackers: DashMap::new(),
            advisories: DashMap::new(),
            evaluation_cycles: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn evaluation_cycles(&self) -> u64 {
        self.evaluation_cycles.load(Ordering::Relaxed)
    }

    // ---- cameras ----

    pub fn register_camera(&self, camera: Camera) -> Result<Camera, StoreError> {
        if !camera.location.is_valid() {
            return Err(StoreError::InvalidCoordinate);
        }
        if self.cameras.contains_key(&camera.camera_id) {
            return Err(StoreError::CameraExists(camera.camera_id));
        }
        self.cameras.insert(camera.camera_id.clone(), camera.clone());
        Ok(camera)
    }

    pub fn get_camera(&self, camera_id: &str) -> Option<Camera> {
        self.cameras.get(camera_id).map(|r| r.value().clone())
    }

    pub fn list_cameras(&self) -> Vec<Camera> {
        self.cameras.iter().map(|r| r.value().clone()).collect()
    }

    // ---- alerts ----

    /// Raise a new alert against a registered camera. The alert inherits
    /// the camera's location at creation time.
    pub fn raise_alert(
        &self,
        camera_id: &str,
        severity: AlertSeverity,
        category: AlertCategory,
        notes: Option<String>,
    ) -> Result<HazardAlert, StoreError> {
        let location = self
            .get_camera(camera_id)
            .map(|c| c.location)
            .ok_or_else(|| StoreError::CameraNotFound(camera_id.to_string()))?;

        let alert = HazardAlert {
            id: uuid::Uuid::new_v4().to_string(),
            camera_id: camera_id.to_string(),
            location,
            severity,
            category,
            status: AlertStatus::Active,
            notes,
            acknowledged_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        };
        self.alerts.insert(alert.id.clone(), alert.clone());
        Ok(alert)
    }

    pub fn get_alert(&self, id: &str) -> Option<HazardAlert> {
        self.alerts.get(id).map(|r| r.value().clone())
    }

    /// List alerts, newest first, optionally filtered by status.
    pub fn list_alerts(&self, status: Option<AlertStatus>) -> Vec<HazardAlert> {
        let mut alerts: Vec<HazardAlert> = self
            .alerts
            .iter()
            .filter(|r| status.map_or(true, |s| r.value().status == s))
            .map(|r| r.value().clone())
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts
    }

    fn active_alerts(&self) -> Vec<HazardAlert> {
        self.alerts
            .iter()
            .filter(|r| r.value().is_active())
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn acknowledge_alert(
        &self,
        id: &str,
        by: Acknowledgement,
    ) -> Result<HazardAlert, StoreError> {
        let mut entry = self
            .alerts
            .get_mut(id)
            .ok_or_else(|| StoreError::AlertNotFound(id.to_string()))?;
        entry.value_mut().acknowledge(by)?;
        Ok(entry.value().clone())
    }

    pub fn resolve_alert(&self, id: &str) -> Result<HazardAlert, StoreError> {
        let mut entry = self
            .alerts
            .get_mut(id)
            .ok_or_else(|| StoreError::AlertNotFound(id.to_string()))?;
        entry.value_mut().resolve(Utc::now())?;
        Ok(entry.value().clone())
    }

    pub fn false_alarm_alert(&self, id: &str) -> Result<HazardAlert, StoreError> {
        let mut entry = self
            .alerts
            .get_mut(id)
            .ok_or_else(|| StoreError::AlertNotFound(id.to_string()))?;
        entry.value_mut().mark_false_alarm(Utc::now())?;
        Ok(entry.value().clone())
    }

    /// Drop retired alerts older than the retention window.
    /// Returns the number of alerts removed.
    pub fn prune_retired_alerts(&self, now: DateTime<Utc>) -> usize {
        let retention = self.config.alert_retention_secs;
        let before = self.alerts.len();
        self.alerts.retain(|_, alert| {
            if alert.is_active() || alert.status == AlertStatus::Acknowledged {
                return true;
            }
            let retired_at = alert.resolved_at.unwrap_or(alert.created_at);
            (now - retired_at).num_seconds() <= retention
        });
        before - self.alerts.len()
    }

    // ---- trains ----

    pub fn register_train(
        &self,
        report: &PositionReport,
        name: &str,
        max_speed_kmh: Option<f64>,
    ) -> Result<Train, StoreError> {
        if !report.position.is_valid() {
            return Err(StoreError::InvalidCoordinate);
        }
        if self.trains.contains_key(&report.train_id) {
            return Err(StoreError::TrainExists(report.train_id.clone()));
        }

        let max = max_speed_kmh.unwrap_or(self.config.default_max_speed_kmh);
        let train = Train::from_registration(report, name, max);
        self.trackers.insert(
            train.train_id.clone(),
            SpeedTracker::new(train.current_speed_kmh, max),
        );
        self.trains.insert(train.train_id.clone(), train.clone());
        Ok(train)
    }

    pub fn get_train(&self, train_id: &str) -> Option<Train> {
        self.trains.get(train_id).map(|r| r.value().clone())
    }

    pub fn list_trains(&self) -> Vec<Train> {
        self.trains.iter().map(|r| r.value().clone()).collect()
    }

    pub fn apply_position(&self, report: &PositionReport) -> Result<Train, StoreError> {
        if !report.position.is_valid() {
            return Err(StoreError::InvalidCoordinate);
        }
        let mut entry = self
            .trains
            .get_mut(&report.train_id)
            .ok_or_else(|| StoreError::TrainNotFound(report.train_id.clone()))?;
        entry.value_mut().apply_report(report);
        Ok(entry.value().clone())
    }

    // ---- advisories ----

    pub fn advisory_for(&self, train_id: &str) -> Option<TrainAdvisory> {
        self.advisories.get(train_id).map(|r| r.value().clone())
    }

    pub fn list_advisories(&self) -> Vec<TrainAdvisory> {
        self.advisories.iter().map(|r| r.value().clone()).collect()
    }

    /// Evaluate every running train against the current active alert set
    /// and advance its speed tracker by one tick.
    ///
    /// Proximity is recomputed from live positions each cycle; a bad
    /// record skips that train only. Returns the number of trains
    /// evaluated.
    pub fn run_evaluation_cycle(&self, now: DateTime<Utc>) -> usize {
        let alerts = self.active_alerts();
        let trains = self.list_trains();
        let mut evaluated = 0;

        for train in trains {
            if train.status == TrainStatus::Maintenance {
                continue;
            }
            if !train.position.is_valid() {
                tracing::warn!(train_id = %train.train_id, "skipping train with invalid position");
                continue;
            }

            let result = advisory::evaluate(
                train.position,
                &alerts,
                train.max_speed_kmh,
                &self.config.rules,
                now,
            );

            let mut tracker = self
                .trackers
                .entry(train.train_id.clone())
                .or_insert_with(|| SpeedTracker::new(train.current_speed_kmh, train.max_speed_kmh));
            let previous_phase = tracker.phase;
            tracker.tick(result.target_speed_kmh, result.nearest_distance_km);
            let tracker_snapshot = tracker.clone();
            drop(tracker);

            if tracker_snapshot.phase != previous_phase {
                tracing::info!(
                    train_id = %train.train_id,
                    from = ?previous_phase,
                    to = ?tracker_snapshot.phase,
                    target_kmh = result.target_speed_kmh,
                    "advisory phase transition"
                );
            }

            if tracker_snapshot.phase == TrackerPhase::Stopped {
                if let Some(mut entry) = self.trains.get_mut(&train.train_id) {
                    entry.value_mut().status = TrainStatus::Stopped;
                }
            }

            self.advisories.insert(
                train.train_id.clone(),
                TrainAdvisory {
                    train_id: train.train_id.clone(),
                    target_speed_kmh: result.target_speed_kmh,
                    advised_speed_kmh: tracker_snapshot.current_kmh,
                    phase: tracker_snapshot.phase,
                    speed_band: result.speed_band,
                    nearest_distance_km: result.nearest_distance_km,
                    alert_ids: result.alert_ids,
                    evaluated_at: now,
                },
            );
            evaluated += 1;
        }

        self.evaluation_cycles.fetch_add(1, Ordering::Relaxed);
        evaluated
    }

    /// Direct distance between a train and an alert's source, with a
    /// naive ETA at the train's current speed.
    pub fn distance_to_alert(
        &self,
        train_id: &str,
        alert_id: &str,
    ) -> Result<(f64, f64), StoreError> {
        let train = self
            .get_train(train_id)
            .ok_or_else(|| StoreError::TrainNotFound(train_id.to_string()))?;
        let alert = self
            .get_alert(alert_id)
            .ok_or_else(|| StoreError::AlertNotFound(alert_id.to_string()))?;

        let distance_km = railguard_core::haversine_km(train.position, alert.location);
        // The source system fell back to 60 km/h when no speed was known.
        let speed = if train.current_speed_kmh > 0.0 {
            train.current_speed_kmh
        } else {
            60.0
        };
        let eta_minutes = distance_km / speed * 60.0;
        Ok((distance_km, eta_minutes))
    }
}
