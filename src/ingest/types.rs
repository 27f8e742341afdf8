// src/ingest/types.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Coordinates;

/// A timeline post, cleaned of redundant upstream fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialPost {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One stored forecast poll: the raw upstream document tagged with its area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSample {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "_area")]
    pub area: String,
    #[serde(flatten)]
    pub forecast: Map<String, Value>,
}

/// View over the hourly forecast document. Points stay raw until one is picked.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyForecast {
    #[serde(default)]
    pub features: Vec<ForecastFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastFeature {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastProperties {
    #[serde(rename = "timeSeries", default)]
    pub time_series: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    /// `YYYY-MM-DDTHH:MMZ`
    pub time: String,
    pub screen_temperature: f64,
    pub wind_speed10m: f64,
    #[serde(default)]
    pub wind_direction_from10m: Option<f64>,
    pub prob_of_precipitation: f64,
    pub precipitation_rate: f64,
}

impl HourlyForecast {
    pub fn series(&self) -> &[Value] {
        self.features
            .first()
            .map(|f| f.properties.time_series.as_slice())
            .unwrap_or_default()
    }

    /// The point at `time`, if any. Other points are never parsed, so a
    /// gap elsewhere in the series does not matter.
    pub fn point_at(&self, time: &str) -> Result<Option<ForecastPoint>> {
        let Some(raw) = self
            .series()
            .iter()
            .find(|p| p.get("time").and_then(Value::as_str) == Some(time))
        else {
            return Ok(None);
        };
        let point = serde_json::from_value(raw.clone())
            .with_context(|| format!("forecast point at {time}"))?;
        Ok(Some(point))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    /// Kept raw: the name key has shipped as both `name` and `Name`.
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub url: Option<String>,
    /// `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw search response. Errors come back as `status = "error"` with code/message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsBatch {
    /// Fetch time as `YYYYMMDDHHMM`.
    #[serde(rename = "_id")]
    pub id: i64,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentEvents {
    /// Day as `YYYYMMDD`.
    #[serde(rename = "_id")]
    pub id: i64,
    /// e.g. `18 Oct 2026`
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TravelTime {
    /// `None` when the lookup timed out.
    pub travel_time_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JourneyInfo {
    pub start: String,
    pub end: String,
    pub travel_time: TravelTime,
}

#[async_trait::async_trait]
pub trait TimelineSource: Send + Sync {
    /// Posts newest-first, as upstream returns them.
    async fn user_timeline(
        &self,
        screen_name: &str,
        since_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<SocialPost>>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait ForecastSource: Send + Sync {
    async fn hourly_forecast(&self, at: Coordinates) -> Result<Map<String, Value>>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// `from` is `YYYY-MM-DDTHH:MM:SS`; `None` searches without a lower bound.
    async fn everything(&self, sources: &str, from: Option<&str>) -> Result<NewsResponse>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait CurrentEventsSource: Send + Sync {
    /// `Ok(None)` when nothing has been published for `today` yet.
    async fn current_events(&self, today: NaiveDate) -> Result<Option<CurrentEvents>>;
    fn name(&self) -> &'static str;
}
