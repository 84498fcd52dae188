//! Core data models for the railguard system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees.
///
/// Longitude comes first to match the source data convention
/// (GeoJSON-style `[lon, lat]` pairs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that both components are finite and in range.
    ///
    /// Alerts or trains carrying an invalid coordinate are skipped
    /// during evaluation rather than aborting the whole cycle.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

/// Severity assigned when a hazard alert is raised. Immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// What kind of safety event the alert represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    AnimalDetected,
    AnimalPersistent,
    TrainApproaching,
    SpeedReduction,
    Emergency,
}

/// Lifecycle status of a hazard alert.
///
/// Only `Active` alerts participate in proximity evaluation; the other
/// states are excluded regardless of distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    FalseAlarm,
}

/// Operator identity recorded when an alert is acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub operator_id: String,
    pub operator_name: String,
    pub timestamp: DateTime<Utc>,
}

/// An active safety event raised by a trackside camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardAlert {
    pub id: String,
    /// Camera that raised the alert.
    pub camera_id: String,
    /// Location of the raising camera, captured at creation time.
    pub location: Coordinate,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub status: AlertStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub acknowledged_by: Option<Acknowledgement>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Invalid alert lifecycle transition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("alert {id} is {status:?}, cannot transition to {requested:?}")]
pub struct LifecycleError {
    pub id: String,
    pub status: AlertStatus,
    pub requested: AlertStatus,
}

impl HazardAlert {
    /// Whether this alert should be considered by the evaluator.
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    fn transition_error(&self, requested: AlertStatus) -> LifecycleError {
        LifecycleError {
            id: self.id.clone(),
            status: self.status,
            requested,
        }
    }

    /// Active -> Acknowledged.
    pub fn acknowledge(&mut self, by: Acknowledgement) -> Result<(), LifecycleError> {
        if self.status != AlertStatus::Active {
            return Err(self.transition_error(AlertStatus::Acknowledged));
        }
        self.status = AlertStatus::Acknowledged;
        self.acknowledged_by = Some(by);
        Ok(())
    }

    /// Active/Acknowledged -> Resolved.
    pub fn resolve(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        match self.status {
            AlertStatus::Active | AlertStatus::Acknowledged => {
                self.status = AlertStatus::Resolved;
                self.resolved_at = Some(at);
                Ok(())
            }
            _ => Err(self.transition_error(AlertStatus::Resolved)),
        }
    }

    /// Active -> FalseAlarm.
    pub fn mark_false_alarm(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        if self.status != AlertStatus::Active {
            return Err(self.transition_error(AlertStatus::FalseAlarm));
        }
        self.status = AlertStatus::FalseAlarm;
        self.resolved_at = Some(at);
        Ok(())
    }
}

/// A trackside camera/sensor installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub camera_id: String,
    pub location: Coordinate,
    pub railway_section: String,
    #[serde(default)]
    pub nearest_station: Option<String>,
    pub status: CameraStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    #[default]
    Active,
    Maintenance,
    Offline,
}

/// Operating status of a train under advisory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainStatus {
    #[default]
    Running,
    Stopped,
    Maintenance,
}

/// Current state of a registered train.
///
/// Position and speed are mutated only by position reports and by the
/// advisory loop; nothing else writes these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Train {
    pub train_id: String,
    pub name: String,
    pub position: Coordinate,
    pub current_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub status: TrainStatus,
    pub last_update: DateTime<Utc>,
}

impl Train {
    /// Create a new train from a registration request.
    pub fn from_registration(report: &PositionReport, name: &str, max_speed_kmh: f64) -> Self {
        Self {
            train_id: report.train_id.clone(),
            name: name.to_string(),
            position: report.position,
            current_speed_kmh: report.speed_kmh.max(0.0),
            max_speed_kmh,
            status: TrainStatus::Running,
            last_update: report.timestamp,
        }
    }

    /// Update position and speed from a new report.
    pub fn apply_report(&mut self, report: &PositionReport) {
        self.position = report.position;
        self.current_speed_kmh = report.speed_kmh.clamp(0.0, self.max_speed_kmh);
        self.last_update = report.timestamp;
        if self.status == TrainStatus::Stopped && report.speed_kmh > 0.0 {
            self.status = TrainStatus::Running;
        }
    }
}

/// Position update received from a train unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionReport {
    pub train_id: String,
    pub position: Coordinate,
    #[serde(default)]
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alert() -> HazardAlert {
        HazardAlert {
            id: "A1".into(),
            camera_id: "CAM-01".into(),
            location: Coordinate::new(77.21, 28.614),
            severity: AlertSeverity::High,
            category: AlertCategory::AnimalDetected,
            status: AlertStatus::Active,
            notes: None,
            acknowledged_by: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_twice_is_rejected() {
        let mut alert = sample_alert();
        alert.resolve(Utc::now()).unwrap();
        let err = alert.resolve(Utc::now()).unwrap_err();
        assert_eq!(err.status, AlertStatus::Resolved);
    }

    #[test]
    fn acknowledged_alert_can_still_be_resolved() {
        let mut alert = sample_alert();
        alert
            .acknowledge(Acknowledgement {
                operator_id: "op-1".into(),
                operator_name: "Station Master".into(),
                timestamp: Utc::now(),
            })
            .unwrap();
        assert!(!alert.is_active());
        alert.resolve(Utc::now()).unwrap();
        assert_eq!(alert.status, AlertStatus::Resolved);
    }

    #[test]
    fn false_alarm_requires_active_alert() {
        let mut alert = sample_alert();
        alert.resolve(Utc::now()).unwrap();
        assert!(alert.mark_false_alarm(Utc::now()).is_err());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(!Coordinate::new(77.2, 123.4).is_valid());
        assert!(!Coordinate::new(f64::NAN, 28.6).is_valid());
        assert!(Coordinate::new(77.2, 28.6).is_valid());
    }

    #[test]
    fn apply_report_clamps_speed_to_max() {
        let report = PositionReport {
            train_id: "T1".into(),
            position: Coordinate::new(77.2, 28.6),
            speed_kmh: 0.0,
            timestamp: Utc::now(),
        };
        let mut train = Train::from_registration(&report, "Shatabdi Express", 120.0);

        let fast = PositionReport {
            speed_kmh: 180.0,
            timestamp: Utc::now(),
            ..report
        };
        train.apply_report(&fast);
        assert_eq!(train.current_speed_kmh, 120.0);
    }

    #[test]
    fn stopped_train_resumes_on_moving_report() {
        let report = PositionReport {
            train_id: "T1".into(),
            position: Coordinate::new(77.2, 28.6),
            speed_kmh: 0.0,
            timestamp: Utc::now(),
        };
        let mut train = Train::from_registration(&report, "Test", 120.0);
        train.status = TrainStatus::Stopped;

        let moving = PositionReport {
            speed_kmh: 30.0,
            timestamp: Utc::now(),
            ..report
        };
        train.apply_report(&moving);
        assert_eq!(train.status, TrainStatus::Running);
    }
}
