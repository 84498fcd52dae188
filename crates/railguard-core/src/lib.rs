pub mod advisory;
pub mod models;
pub mod spatial;
pub mod tracker;

pub use advisory::{
    evaluate, nearby_alerts, target_speed, Advisory, AdvisoryRules, NearbyAlert, SpeedBand,
};
pub use models::{
    Acknowledgement, AlertCategory, AlertSeverity, AlertStatus, Camera, CameraStatus, Coordinate,
    HazardAlert, LifecycleError, PositionReport, Train, TrainStatus,
};
pub use spatial::haversine_km;
pub use tracker::{SpeedTracker, TrackerPhase};
