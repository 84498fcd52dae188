//! Speed-tracking state machine.
//!
//! Nudges a train's advised speed toward the evaluator's target on a
//! fixed tick, with more aggressive deceleration the closer the hazard.

use serde::{Deserialize, Serialize};

/// Acceleration step per tick when resuming after a clear zone.
const RESUME_STEP_KMH: f64 = 0.5;
/// Deceleration per tick when the nearest hazard is within 1 km.
const DECEL_CLOSE_KMH: f64 = 5.0;
/// Deceleration per tick when the nearest hazard is within 2 km.
const DECEL_NEAR_KMH: f64 = 3.0;
/// Deceleration per tick otherwise.
const DECEL_FAR_KMH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    /// No advisory in effect; holding or recovering toward max speed.
    Monitoring,
    /// Converging down toward a reduced target.
    SpeedReducing,
    /// Speed or hazard distance decayed to zero.
    Stopped,
}

/// Per-train advised-speed tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedTracker {
    pub current_kmh: f64,
    pub max_kmh: f64,
    pub phase: TrackerPhase,
}

impl SpeedTracker {
    pub fn new(initial_kmh: f64, max_kmh: f64) -> Self {
        let max_kmh = max_kmh.max(0.0);
        Self {
            current_kmh: initial_kmh.clamp(0.0, max_kmh),
            max_kmh,
            phase: TrackerPhase::Monitoring,
        }
    }

    /// Advance one tick toward `target_kmh`.
    ///
    /// `nearest_distance_km` is the distance to the closest qualifying
    /// hazard, `None` in a clear zone. The step is bounded, so current
    /// speed reaches the target within a bounded number of ticks and
    /// never overshoots past zero or past the configured maximum.
    pub fn tick(&mut self, target_kmh: f64, nearest_distance_km: Option<f64>) {
        let target = target_kmh.clamp(0.0, self.max_kmh);

        if nearest_distance_km.is_none() {
            // Clear zone: recover toward the (full-speed) target.
            self.phase = TrackerPhase::Monitoring;
            if self.current_kmh < target {
                self.current_kmh = (self.current_kmh + RESUME_STEP_KMH).min(target);
            } else {
                self.current_kmh = self.current_kmh.min(target);
            }
            return;
        }

        let distance = nearest_distance_km.unwrap_or(f64::MAX);

        if distance <= 0.0 {
            self.current_kmh = 0.0;
            self.phase = TrackerPhase::Stopped;
            return;
        }

        if self.current_kmh > target {
            let step = if distance <= 1.0 {
                DECEL_CLOSE_KMH
            } else if distance <= 2.0 {
                DECEL_NEAR_KMH
            } else {
                DECEL_FAR_KMH
            };
            self.current_kmh = (self.current_kmh - step).max(target).max(0.0);
            self.phase = if self.current_kmh <= 0.0 {
                TrackerPhase::Stopped
            } else {
                TrackerPhase::SpeedReducing
            };
        } else if self.current_kmh < target {
            // Target rose while a hazard is still nearby (e.g. severity
            // downgraded); recover at the resume rate.
            self.current_kmh = (self.current_kmh + RESUME_STEP_KMH).min(target);
            self.phase = TrackerPhase::SpeedReducing;
        } else if self.current_kmh <= 0.0 {
            self.phase = TrackerPhase::Stopped;
        }
        // At the fixpoint (current == target > 0) phase is left unchanged.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_reduced_target_without_overshoot() {
        let mut tracker = SpeedTracker::new(120.0, 120.0);

        // Hazard 0.13 km away, target 20 km/h.
        for _ in 0..100 {
            tracker.tick(20.0, Some(0.13));
        }
        assert_eq!(tracker.current_kmh, 20.0);
        assert_eq!(tracker.phase, TrackerPhase::SpeedReducing);
    }

    #[test]
    fn reaches_target_within_bounded_ticks() {
        let mut tracker = SpeedTracker::new(120.0, 120.0);
        let mut ticks = 0;
        while tracker.current_kmh > 20.0 {
            tracker.tick(20.0, Some(0.5));
            ticks += 1;
            assert!(ticks <= 20, "failed to converge: {:?}", tracker);
        }
        // 100 km/h of reduction at 5 km/h per tick.
        assert_eq!(ticks, 20);
    }

    #[test]
    fn stable_at_fixpoint() {
        let mut tracker = SpeedTracker::new(20.0, 120.0);
        tracker.tick(20.0, Some(0.5));
        let snapshot = tracker.clone();
        for _ in 0..10 {
            tracker.tick(20.0, Some(0.5));
        }
        assert_eq!(tracker.current_kmh, snapshot.current_kmh);
        assert_eq!(tracker.phase, snapshot.phase);
    }

    #[test]
    fn zero_distance_stops_the_train() {
        let mut tracker = SpeedTracker::new(60.0, 120.0);
        tracker.tick(20.0, Some(0.0));
        assert_eq!(tracker.current_kmh, 0.0);
        assert_eq!(tracker.phase, TrackerPhase::Stopped);
    }

    #[test]
    fn decay_to_zero_stops_the_train() {
        let mut tracker = SpeedTracker::new(8.0, 120.0);
        tracker.tick(0.0, Some(0.8));
        assert_eq!(tracker.phase, TrackerPhase::SpeedReducing);
        tracker.tick(0.0, Some(0.8));
        assert_eq!(tracker.current_kmh, 0.0);
        assert_eq!(tracker.phase, TrackerPhase::Stopped);
    }

    #[test]
    fn clear_zone_returns_to_monitoring_and_recovers() {
        let mut tracker = SpeedTracker::new(120.0, 120.0);
        for _ in 0..25 {
            tracker.tick(20.0, Some(0.5));
        }
        assert_eq!(tracker.phase, TrackerPhase::SpeedReducing);

        tracker.tick(120.0, None);
        assert_eq!(tracker.phase, TrackerPhase::Monitoring);
        assert!(tracker.current_kmh > 20.0);

        for _ in 0..300 {
            tracker.tick(120.0, None);
        }
        assert_eq!(tracker.current_kmh, 120.0);
    }

    #[test]
    fn stopped_recovers_after_clear_zone() {
        let mut tracker = SpeedTracker::new(10.0, 120.0);
        tracker.tick(0.0, Some(0.0));
        assert_eq!(tracker.phase, TrackerPhase::Stopped);

        tracker.tick(120.0, None);
        assert_eq!(tracker.phase, TrackerPhase::Monitoring);
        assert_eq!(tracker.current_kmh, RESUME_STEP_KMH);
    }

    #[test]
    fn deceleration_is_distance_dependent() {
        let mut close = SpeedTracker::new(100.0, 120.0);
        let mut far = SpeedTracker::new(100.0, 120.0);
        close.tick(20.0, Some(0.5));
        far.tick(20.0, Some(1.8));
        assert_eq!(close.current_kmh, 95.0);
        assert_eq!(far.current_kmh, 97.0);
    }

    #[test]
    fn never_exceeds_configured_maximum() {
        let mut tracker = SpeedTracker::new(119.9, 120.0);
        for _ in 0..5 {
            tracker.tick(120.0, None);
        }
        assert_eq!(tracker.current_kmh, 120.0);
    }
}
