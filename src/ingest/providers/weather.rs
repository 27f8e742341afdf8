// src/ingest/providers/weather.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

use crate::config::{Coordinates, CredentialSource};
use crate::ingest::types::ForecastSource;

pub const DEFAULT_BASE_URL: &str =
    "https://api-metoffice.apiconnect.ibmcloud.com/metoffice/production/v0";

pub const MPS_TO_MPH: f64 = 2.23694;

const CARDINALS: [&str; 8] = [
    "North",
    "North East",
    "East",
    "South East",
    "South",
    "South West",
    "West",
    "North West",
];

/// Compass label for a wind bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    Cardinal(&'static str),
    /// Bearing outside `[0, 360]`.
    Invalid,
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compass::Cardinal(label) => f.write_str(label),
            Compass::Invalid => f.write_str("Invalid bearing value"),
        }
    }
}

/// 45° sectors centred on each label; 337.5..=360 wraps back to North.
pub fn bearing_to_cardinal(bearing: Option<f64>) -> Option<Compass> {
    let bearing = bearing?;
    if !(0.0..=360.0).contains(&bearing) {
        return Some(Compass::Invalid);
    }
    let sector = 180.0 / CARDINALS.len() as f64;
    let label = CARDINALS
        .iter()
        .enumerate()
        .find(|(i, _)| sector + 45.0 * *i as f64 > bearing)
        .map_or("North", |(_, label)| *label);
    Some(Compass::Cardinal(label))
}

/// Two decimals, ties to even.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

pub fn mps_to_mph(mps: f64) -> f64 {
    round2(mps * MPS_TO_MPH)
}

/// Hourly point forecasts.
pub struct WeatherClient {
    base_url: String,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(creds: &dyn CredentialSource) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: creds.secret("met-office", "client-id")?,
            client_secret: creds.secret("met-office", "client-secret")?,
            client: super::http_client()?,
            timeout: Duration::from_secs(1),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ForecastSource for WeatherClient {
    async fn hourly_forecast(&self, at: Coordinates) -> Result<Map<String, Value>> {
        let body: Value = self
            .client
            .get(format!("{}/forecasts/point/hourly", self.base_url))
            .header("accept", "application/json")
            .header("x-ibm-client-id", &self.client_id)
            .header("x-ibm-client-secret", &self.client_secret)
            .query(&[
                ("excludeParameterMetadata", "false".to_string()),
                ("includeLocationName", "true".to_string()),
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .context("weather http get()")?
            .error_for_status()
            .context("weather non-2xx")?
            .json()
            .await
            .context("weather body")?;

        match body {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("weather: expected a JSON object, got {other}")),
        }
    }

    fn name(&self) -> &'static str {
        "met-office"
    }
}
