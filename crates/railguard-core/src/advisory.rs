//! Proximity Alert Evaluator.
//!
//! Pure functions mapping a train position plus the current hazard alert
//! set to a recommended target speed. Side effects (notification,
//! logging, speed actuation) belong to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{AlertCategory, AlertSeverity, Coordinate, HazardAlert};
use crate::spatial::haversine_km;

/// Thresholds and speed tiers for the advisory policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRules {
    /// Radius around the train within which alerts are considered.
    pub radius_km: f64,
    /// Target when any high/critical alert is nearby.
    pub critical_speed_kmh: f64,
    /// Target when any animal-category alert is nearby.
    pub animal_speed_kmh: f64,
    /// Target when any other alert is nearby.
    pub caution_speed_kmh: f64,
    /// Alerts older than this are ignored even while still active.
    pub max_alert_age_secs: i64,
}

impl Default for AdvisoryRules {
    fn default() -> Self {
        Self {
            radius_km: 2.0,
            critical_speed_kmh: 20.0,
            animal_speed_kmh: 40.0,
            caution_speed_kmh: 60.0,
            max_alert_age_secs: 300,
        }
    }
}

/// An active alert within the evaluation radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyAlert {
    pub alert: HazardAlert,
    pub distance_km: f64,
}

/// Display tier keyed on distance to the single nearest hazard.
///
/// This is a labeling strategy for per-train status displays only; the
/// severity-based policy in [`target_speed`] is the canonical speed
/// advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedBand {
    FullStop,
    SignificantReduction,
    SlightReduction,
    None,
}

impl SpeedBand {
    pub fn for_distance(distance_km: Option<f64>) -> Self {
        match distance_km {
            Some(d) if d <= 1.0 => SpeedBand::FullStop,
            Some(d) if d <= 2.0 => SpeedBand::SignificantReduction,
            Some(d) if d <= 5.0 => SpeedBand::SlightReduction,
            _ => SpeedBand::None,
        }
    }
}

/// Result of one evaluation cycle for a single train.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub target_speed_kmh: f64,
    pub speed_band: SpeedBand,
    /// Distance to the nearest qualifying alert, if any.
    pub nearest_distance_km: Option<f64>,
    /// Ids of nearby alerts, ordered by ascending distance.
    pub alert_ids: Vec<String>,
}

/// Find active alerts within `rules.radius_km` of `position`, sorted by
/// ascending distance.
///
/// Membership is recomputed live from current position on every call,
/// never read from a stored alert-to-train edge. Alerts with invalid
/// coordinates or past `max_alert_age_secs` are skipped.
pub fn nearby_alerts(
    position: Coordinate,
    alerts: &[HazardAlert],
    rules: &AdvisoryRules,
    now: DateTime<Utc>,
) -> Vec<NearbyAlert> {
    let mut nearby: Vec<NearbyAlert> = alerts
        .iter()
        .filter(|alert| alert.is_active())
        .filter(|alert| alert.location.is_valid())
        .filter(|alert| (now - alert.created_at).num_seconds() <= rules.max_alert_age_secs)
        .filter_map(|alert| {
            let distance_km = haversine_km(position, alert.location);
            (distance_km <= rules.radius_km).then(|| NearbyAlert {
                alert: alert.clone(),
                distance_km,
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    nearby
}

/// Map the filtered alert set to a target speed.
///
/// Priority-ordered rules; the first clause whose condition holds wins:
/// 1. any high/critical severity -> `critical_speed_kmh`
/// 2. any animal category -> `animal_speed_kmh`
/// 3. any alert at all -> `caution_speed_kmh`
/// 4. clear zone -> the train's configured maximum
pub fn target_speed(nearby: &[NearbyAlert], max_speed_kmh: f64, rules: &AdvisoryRules) -> f64 {
    let has_critical = nearby.iter().any(|n| {
        matches!(
            n.alert.severity,
            AlertSeverity::High | AlertSeverity::Critical
        )
    });
    if has_critical {
        return rules.critical_speed_kmh;
    }

    let has_animal = nearby.iter().any(|n| {
        matches!(
            n.alert.category,
            AlertCategory::AnimalDetected | AlertCategory::AnimalPersistent
        )
    });
    if has_animal {
        return rules.animal_speed_kmh;
    }

    if !nearby.is_empty() {
        return rules.caution_speed_kmh;
    }

    max_speed_kmh
}

/// Run one full evaluation cycle for a train position.
pub fn evaluate(
    position: Coordinate,
    alerts: &[HazardAlert],
    max_speed_kmh: f64,
    rules: &AdvisoryRules,
    now: DateTime<Utc>,
) -> Advisory {
    let nearby = nearby_alerts(position, alerts, rules, now);
    let nearest_distance_km = nearby.first().map(|n| n.distance_km);

    Advisory {
        target_speed_kmh: target_speed(&nearby, max_speed_kmh, rules),
        speed_band: SpeedBand::for_distance(nearest_distance_km),
        nearest_distance_km,
        alert_ids: nearby.iter().map(|n| n.alert.id.clone()).collect(),
    }
}
