//! HTTP client for the railguard server.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use railguard_core::{AlertCategory, AlertSeverity, AlertStatus, Camera, Coordinate, HazardAlert, Train};

/// Client for talking to a railguard server.
///
/// Read endpoints are public; mutating endpoints require the operator
/// token.
pub struct RailguardClient {
    base_url: String,
    operator_token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct RegisterCameraRequest<'a> {
    camera_id: &'a str,
    location: Coordinate,
    railway_section: &'a str,
}

#[derive(Debug, Serialize)]
struct RaiseAlertRequest<'a> {
    camera_id: &'a str,
    severity: AlertSeverity,
    category: AlertCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RegisterTrainRequest<'a> {
    train_id: &'a str,
    name: &'a str,
    position: Coordinate,
    speed_kmh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_speed_kmh: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PositionRequest {
    position: Coordinate,
    speed_kmh: f64,
    timestamp: chrono::DateTime<Utc>,
}

impl RailguardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            operator_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attach the operator token used on mutating endpoints.
    pub fn with_operator_token(mut self, token: impl Into<String>) -> Self {
        self.operator_token = Some(token.into());
        self
    }

    fn operator_post(&self, url: String) -> Result<reqwest::RequestBuilder> {
        let Some(token) = self.operator_token.as_deref() else {
            bail!("operator token required for {url}");
        };
        Ok(self.client.post(url).bearer_auth(token))
    }

    /// Register a trackside camera.
    pub async fn register_camera(
        &self,
        camera_id: &str,
        location: Coordinate,
        railway_section: &str,
    ) -> Result<Camera> {
        let url = format!("{}/v1/cameras", self.base_url);
        let request = RegisterCameraRequest {
            camera_id,
            location,
            railway_section,
        };
        let response = self
            .operator_post(url)?
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Raise a hazard alert against a registered camera.
    pub async fn raise_alert(
        &self,
        camera_id: &str,
        severity: AlertSeverity,
        category: AlertCategory,
        notes: Option<&str>,
    ) -> Result<HazardAlert> {
        let url = format!("{}/v1/alerts", self.base_url);
        let request = RaiseAlertRequest {
            camera_id,
            severity,
            category,
            notes,
        };
        let response = self
            .operator_post(url)?
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Resolve an alert.
    pub async fn resolve_alert(&self, alert_id: &str) -> Result<HazardAlert> {
        let url = format!("{}/v1/alerts/{alert_id}/resolve", self.base_url);
        let response = self
            .operator_post(url)?
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch alerts, optionally filtered by lifecycle status.
    pub async fn fetch_alerts(&self, status: Option<AlertStatus>) -> Result<Vec<HazardAlert>> {
        let mut url = format!("{}/v1/alerts", self.base_url);
        if let Some(status) = status {
            let tag = serde_json::to_value(status)?;
            let tag = tag.as_str().unwrap_or_default().to_string();
            url = format!("{url}?status={tag}");
        }
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Register a train under advisory.
    pub async fn register_train(
        &self,
        train_id: &str,
        name: &str,
        position: Coordinate,
        speed_kmh: f64,
        max_speed_kmh: Option<f64>,
    ) -> Result<Train> {
        let url = format!("{}/v1/trains", self.base_url);
        let request = RegisterTrainRequest {
            train_id,
            name,
            position,
            speed_kmh,
            max_speed_kmh,
        };
        let response = self
            .operator_post(url)?
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Send a position report for a train.
    pub async fn send_position(
        &self,
        train_id: &str,
        position: Coordinate,
        speed_kmh: f64,
    ) -> Result<Train> {
        let url = format!("{}/v1/trains/{train_id}/position", self.base_url);
        let request = PositionRequest {
            position,
            speed_kmh,
            timestamp: Utc::now(),
        };
        let response = self
            .operator_post(url)?
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch the latest advisory for one train.
    ///
    /// Returned as raw JSON so dashboards can render fields the SDK
    /// doesn't model yet.
    pub async fn fetch_advisory(&self, train_id: &str) -> Result<Value> {
        let url = format!("{}/v1/advisories/{train_id}", self.base_url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch all current advisories.
    pub async fn fetch_advisories(&self) -> Result<Value> {
        let url = format!("{}/v1/advisories", self.base_url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Direct distance and naive ETA between a train and an alert.
    pub async fn distance_to_alert(&self, train_id: &str, alert_id: &str) -> Result<Value> {
        let url = format!(
            "{}/v1/distance?train_id={train_id}&alert_id={alert_id}",
            self.base_url
        );
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}
