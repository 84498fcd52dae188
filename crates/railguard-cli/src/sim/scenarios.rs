//! Pre-defined advisory scenarios for demos and manual testing.

use railguard_core::spatial::offset_by_bearing;
use railguard_core::{AlertCategory, AlertSeverity, Coordinate};

use super::tracks::LinearTrack;

/// A scripted scenario: one camera, one train run, optionally one alert
/// raised at the start.
pub struct Scenario {
    pub name: String,
    pub camera_id: String,
    pub camera_location: Coordinate,
    pub railway_section: String,
    pub train_id: String,
    pub train_name: String,
    pub max_speed_kmh: f64,
    pub track: LinearTrack,
    pub alert: Option<(AlertSeverity, AlertCategory)>,
}

/// Train approaching a camera with a persistent animal detection.
///
/// The train starts 5 km west of the camera and runs east through it at
/// line speed; the advisory should tighten as it closes within 2 km.
pub fn animal_on_track_scenario(camera_location: Coordinate) -> Scenario {
    let start = offset_by_bearing(camera_location, 5.0, 270.0_f64.to_radians());
    let end = offset_by_bearing(camera_location, 5.0, 90.0_f64.to_radians());

    Scenario {
        name: "animal-on-track".to_string(),
        camera_id: "CAM-SIM-01".to_string(),
        camera_location,
        railway_section: "SIM-SECTION-A".to_string(),
        train_id: "TRAIN-SIM-01".to_string(),
        train_name: "Sim Express".to_string(),
        max_speed_kmh: 120.0,
        track: LinearTrack::new(start, end, 120.0),
        alert: Some((AlertSeverity::Critical, AlertCategory::AnimalPersistent)),
    }
}

/// Same run with no alert raised: the advisory should stay at the
/// train's maximum the whole way.
pub fn clear_section_scenario(camera_location: Coordinate) -> Scenario {
    let start = offset_by_bearing(camera_location, 5.0, 270.0_f64.to_radians());
    let end = offset_by_bearing(camera_location, 5.0, 90.0_f64.to_radians());

    Scenario {
        name: "clear-section".to_string(),
        camera_id: "CAM-SIM-01".to_string(),
        camera_location,
        railway_section: "SIM-SECTION-A".to_string(),
        train_id: "TRAIN-SIM-02".to_string(),
        train_name: "Sim Passenger".to_string(),
        max_speed_kmh: 120.0,
        track: LinearTrack::new(start, end, 120.0),
        alert: None,
    }
}
