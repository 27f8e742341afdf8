// src/ingest/providers/transit.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{CredentialSource, DigestConfig, LocationDirectory};
use crate::ingest::types::{JourneyInfo, TravelTime};

pub const DEFAULT_BASE_URL: &str = "https://developer.citymapper.com/api/1";

/// Travel-time lookups between named locations.
pub struct TransitClient {
    base_url: String,
    api_key: String,
    locations: LocationDirectory,
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CoverageResponse {
    #[serde(default)]
    points: Vec<CoveragePoint>,
}

#[derive(Debug, Deserialize)]
struct CoveragePoint {
    covered: bool,
}

impl TransitClient {
    pub fn new(creds: &dyn CredentialSource, locations: LocationDirectory) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: creds.secret("city-mapper", "api_key")?,
            locations,
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

    /// Minutes from `start` to `end` arriving at `arrival`.
    ///
    /// A timed-out request yields `travel_time_minutes: None`; every other
    /// failure (unknown location, HTTP status, bad body) is an error.
    pub async fn travel_time(
        &self,
        start: &str,
        end: &str,
        arrival: &DateTime<Tz>,
    ) -> Result<TravelTime> {
        let from = self.locations.get(start)?;
        let to = self.locations.get(end)?;
        let params = [
            ("startcoord", from.as_param()),
            ("endcoord", to.as_param()),
            ("time", arrival.to_rfc3339()),
            ("key", self.api_key.clone()),
        ];

        match self.fetch_travel_time(&params).await {
            Ok(t) => Ok(t),
            Err(e) if e.is_timeout() => {
                tracing::info!(start, end, "travel time lookup timed out");
                Ok(TravelTime {
                    travel_time_minutes: None,
                })
            }
            Err(e) => Err(e).context("transit travel time"),
        }
    }

    async fn fetch_travel_time(
        &self,
        params: &[(&str, String)],
    ) -> Result<TravelTime, reqwest::Error> {
        self.client
            .get(format!("{}/traveltime", self.base_url))
            .query(params)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<TravelTime>()
            .await
    }

    /// Whether the named location is inside the service area.
    pub async fn is_covered(&self, location: &str) -> Result<bool> {
        let at = self.locations.get(location)?;
        let rsp: CoverageResponse = self
            .client
            .get(format!("{}/singlepointcoverage", self.base_url))
            .query(&[("coord", at.as_param()), ("key", self.api_key.clone())])
            .timeout(self.timeout)
            .send()
            .await
            .context("transit coverage get()")?
            .error_for_status()
            .context("transit coverage non-2xx")?
            .json()
            .await
            .context("transit coverage body")?;
        Ok(rsp.points.first().is_some_and(|p| p.covered))
    }

    /// Journey from the earliest to the latest configured area, arriving
    /// half an hour after the latest area's hour on `today`.
    pub async fn journey_info(
        &self,
        cfg: &DigestConfig,
        today: NaiveDate,
        tz: Tz,
    ) -> Result<Option<JourneyInfo>> {
        let Some((start, end)) = cfg.journey_endpoints() else {
            return Ok(None);
        };
        let arrival = arrival_time(today, end.hour, tz)?;
        let travel_time = self.travel_time(&start.area, &end.area, &arrival).await?;
        Ok(Some(JourneyInfo {
            start: start.area.clone(),
            end: end.area.clone(),
            travel_time,
        }))
    }
}

/// `today` at `hour:30` local time.
pub fn arrival_time(today: NaiveDate, hour: u32, tz: Tz) -> Result<DateTime<Tz>> {
    let naive = today
        .and_hms_opt(hour, 0, 0)
        .context("arrival hour out of range")?
        + ChronoDuration::minutes(30);
    tz.from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("{naive} does not exist in {tz}"))
}
