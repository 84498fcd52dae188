//! Server configuration from environment.

use railguard_core::AdvisoryRules;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Bearer token required on operator (mutating) routes.
    pub operator_token: String,
    /// Advisory evaluation / speed-tracking tick.
    pub advisory_tick_secs: u64,
    /// Sweep interval for retired alerts.
    pub expiry_sweep_secs: u64,
    /// Retired (resolved/false-alarm) alerts older than this are dropped
    /// from the working set.
    pub alert_retention_secs: i64,
    /// Max speed assigned to trains registered without one.
    pub default_max_speed_kmh: f64,
    pub rules: AdvisoryRules,
}

impl Config {
    pub fn from_env() -> Self {
        let mut rules = AdvisoryRules::default();
        if let Some(radius) = parse_env("RAILGUARD_ADVISORY_RADIUS_KM") {
            rules.radius_km = radius;
        }
        if let Some(age) = parse_env("RAILGUARD_MAX_ALERT_AGE_SECS") {
            rules.max_alert_age_secs = age;
        }

        Self {
            server_port: parse_env("RAILGUARD_PORT").unwrap_or(4000),
            operator_token: env::var("RAILGUARD_OPERATOR_TOKEN")
                .unwrap_or_else(|_| "dev-operator-token".to_string()),
            advisory_tick_secs: parse_env("RAILGUARD_ADVISORY_TICK_SECS").unwrap_or(1),
            expiry_sweep_secs: parse_env("RAILGUARD_EXPIRY_SWEEP_SECS").unwrap_or(60),
            alert_retention_secs: parse_env("RAILGUARD_ALERT_RETENTION_SECS").unwrap_or(3600),
            default_max_speed_kmh: parse_env("RAILGUARD_DEFAULT_MAX_SPEED_KMH").unwrap_or(120.0),
            rules,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
