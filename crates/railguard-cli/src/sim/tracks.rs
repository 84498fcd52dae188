//! Track segment implementations.

use railguard_core::spatial::{bearing, haversine_km, offset_by_bearing};
use railguard_core::Coordinate;

/// Trait for scripted train movement along a track.
pub trait TrackPath: Send + Sync {
    /// Position after `t` seconds from the start of the run.
    fn position_at(&self, t: f64) -> Coordinate;

    /// Reported ground speed in km/h at time `t`.
    fn speed_kmh_at(&self, t: f64) -> f64;

    /// Whether the run has reached the end of the segment.
    fn is_complete(&self, t: f64) -> bool;
}

/// Straight run between two points at constant speed, holding at the
/// end point once reached.
pub struct LinearTrack {
    start: Coordinate,
    end: Coordinate,
    speed_kmh: f64,
    length_km: f64,
    bearing_rad: f64,
}

impl LinearTrack {
    pub fn new(start: Coordinate, end: Coordinate, speed_kmh: f64) -> Self {
        Self {
            start,
            end,
            speed_kmh: speed_kmh.max(0.0),
            length_km: haversine_km(start, end),
            bearing_rad: bearing(start, end),
        }
    }

    fn distance_covered_km(&self, t: f64) -> f64 {
        (self.speed_kmh / 3600.0 * t.max(0.0)).min(self.length_km)
    }
}

impl TrackPath for LinearTrack {
    fn position_at(&self, t: f64) -> Coordinate {
        let covered = self.distance_covered_km(t);
        if covered >= self.length_km {
            return self.end;
        }
        offset_by_bearing(self.start, covered, self.bearing_rad)
    }

    fn speed_kmh_at(&self, t: f64) -> f64 {
        if self.is_complete(t) {
            0.0
        } else {
            self.speed_kmh
        }
    }

    fn is_complete(&self, t: f64) -> bool {
        self.distance_covered_km(t) >= self.length_km
    }
}
