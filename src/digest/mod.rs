// src/digest/mod.rs
//! Digest composition: read the latest stored data, render each section and
//! assemble one HTML document.

pub mod render;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AreaHour, DigestConfig};
use crate::ingest::providers::wiki::day_id;
use crate::ingest::types::{
    Article, CurrentEvents, HourlyForecast, JourneyInfo, NewsBatch, SocialPost, WeatherSample,
};
use crate::ingest::{current_events_namespace, news_namespace, timeline_namespace, weather_namespace};
use crate::store::{from_document, DocumentStore, FieldEq};
use render::{AreaForecast, Sections};

/// Time format of forecast points.
const POINT_TIME: &str = "%Y-%m-%dT%H:%MZ";

/// `hour:00` local on `today`, as a forecast point time.
pub fn forecast_point_time(today: NaiveDate, hour: u32, tz: Tz) -> Result<String> {
    let naive = today
        .and_hms_opt(hour, 0, 0)
        .context("forecast hour out of range")?;
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("{naive} does not exist in {tz}"))?;
    Ok(local.with_timezone(&Utc).format(POINT_TIME).to_string())
}

fn point_local_time(point_time: &str, tz: Tz) -> Result<NaiveDateTime> {
    let utc = NaiveDateTime::parse_from_str(point_time, POINT_TIME)
        .with_context(|| format!("forecast point time {point_time:?}"))?;
    Ok(Utc.from_utc_datetime(&utc).with_timezone(&tz).naive_local())
}

/// Latest stored forecast for each area, at the configured local hour.
/// Areas with no stored poll or no usable point are skipped.
pub async fn weather_forecasts(
    store: &dyn DocumentStore,
    areas: &[AreaHour],
    today: NaiveDate,
    tz: Tz,
) -> Result<Vec<AreaForecast>> {
    let ns = weather_namespace()?;
    let mut out = Vec::with_capacity(areas.len());
    for AreaHour { area, hour } in areas {
        let area_value = Value::String(area.clone());
        let filter = FieldEq {
            field: "_area",
            value: &area_value,
        };
        let Some(doc) = store.find_latest(&ns, Some(filter)).await? else {
            warn!(area = %area, "no stored forecast for area");
            continue;
        };
        let sample: WeatherSample = from_document(doc)?;
        let forecast: HourlyForecast =
            serde_json::from_value(Value::Object(sample.forecast)).context("forecast shape")?;

        let target = forecast_point_time(today, *hour, tz)?;
        let point = match forecast.point_at(&target) {
            Ok(Some(point)) => point,
            Ok(None) => {
                warn!(area = %area, %target, "forecast has no point for target hour");
                continue;
            }
            Err(e) => {
                warn!(area = %area, %target, error = ?e, "incomplete forecast point");
                continue;
            }
        };
        out.push(AreaForecast {
            area: area.clone(),
            local_time: point_local_time(&point.time, tz)?,
            point,
        });
    }
    Ok(out)
}

/// Most recent `count` posts that mention `keyword`, newest first.
pub async fn travel_posts(
    store: &dyn DocumentStore,
    screen_name: &str,
    count: usize,
    keyword: &str,
) -> Result<Vec<SocialPost>> {
    let ns = timeline_namespace(screen_name)?;
    let mut posts = Vec::new();
    for doc in store.find_recent(&ns, count).await? {
        let post: SocialPost = from_document(doc)?;
        if post.full_text.contains(keyword) {
            posts.push(post);
        }
    }
    debug!(kept = posts.len(), keyword, "travel posts selected");
    Ok(posts)
}

pub async fn current_events(
    store: &dyn DocumentStore,
    today: NaiveDate,
) -> Result<Option<CurrentEvents>> {
    let ns = current_events_namespace()?;
    store
        .find_by_id(&ns, day_id(today))
        .await?
        .map(from_document)
        .transpose()
}

/// First `count` articles walking batches newest-first.
pub async fn latest_articles(store: &dyn DocumentStore, count: usize) -> Result<Vec<Article>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let ns = news_namespace()?;
    // Stored batches are never empty, so `count` batches always suffice.
    let mut articles = Vec::with_capacity(count);
    for doc in store.find_recent(&ns, count).await? {
        let batch: NewsBatch = from_document(doc)?;
        articles.extend(batch.articles);
        if articles.len() >= count {
            break;
        }
    }
    articles.truncate(count);
    Ok(articles)
}

/// Render the full digest for `now`.
pub async fn compose(
    store: &dyn DocumentStore,
    cfg: &DigestConfig,
    now: DateTime<Tz>,
    journey: Option<&JourneyInfo>,
) -> Result<String> {
    let tz = now.timezone();
    let today = now.date_naive();

    let forecasts = weather_forecasts(store, &cfg.weather, today, tz).await?;
    let posts = travel_posts(
        store,
        &cfg.twitter.screen_name,
        cfg.twitter.tweet_count,
        &cfg.travel_keyword,
    )
    .await?;
    let events = current_events(store, today).await?;
    let articles = latest_articles(store, cfg.articles).await?;

    let mut travel = String::new();
    if let Some(j) = journey {
        travel.push_str(&render::journey_fragment(j));
    }
    travel.push_str(&render::posts_fragment(&posts, tz));

    Ok(render::page(&Sections {
        weather: render::weather_fragment(&forecasts),
        travel,
        current_events: render::current_events_fragment(events.as_ref()),
        news: render::news_fragment(&articles),
    }))
}
