// src/ingest/mod.rs
//! Incremental aggregation: one run per source.
//!
//! Each run works out what is already stored (the cursor), asks the source
//! only for newer records and writes them with a single store operation.
//! "Nothing new" is a logged no-op, never an error.

pub mod providers;
pub mod types;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use tracing::{info, warn, Instrument};

use crate::cli::KeyValueArgs;
use crate::config::{AppConfig, CredentialSource, LocationDirectory};
use crate::store::{self, to_document, DocumentStore, Namespace, Upsert};
use providers::{news::NewsClient, timeline::TimelineClient, weather::WeatherClient, wiki::WikiClient};
use types::{
    CurrentEventsSource, ForecastSource, NewsBatch, NewsSource, TimelineSource, WeatherSample,
};

/// Default page size for timeline fetches.
pub const DEFAULT_TWEET_COUNT: u32 = 20;

pub fn timeline_namespace(screen_name: &str) -> Result<Namespace> {
    Namespace::new("twitter", screen_name)
}

pub fn weather_namespace() -> Result<Namespace> {
    Namespace::new("metoffice", "hourly")
}

pub fn news_namespace() -> Result<Namespace> {
    Namespace::new("googlenews", "articles")
}

pub fn current_events_namespace() -> Result<Namespace> {
    Namespace::new("wiki", "currentEvents")
}

/// What one aggregator invocation should do, parsed from `key=value` args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    Twitter { screen_name: String, count: u32 },
    MetOffice { area: String },
    Wiki,
    GoogleNews,
}

impl SourceRequest {
    pub const KNOWN_ARGS: &'static [&'static str] =
        &["source", "screen_name", "count", "tweet_mode", "area"];

    pub fn from_args(args: &KeyValueArgs) -> Result<Self> {
        let source = args.require("source")?;
        match source {
            "twitter" => Ok(Self::Twitter {
                screen_name: args.require("screen_name")?.to_string(),
                count: args.parse_value("count")?.unwrap_or(DEFAULT_TWEET_COUNT),
            }),
            "met-office" => Ok(Self::MetOffice {
                area: args.require("area")?.to_string(),
            }),
            "wiki" => Ok(Self::Wiki),
            "google-news" => Ok(Self::GoogleNews),
            other => bail!(
                "data source {other:?} not recognised (expected twitter, met-office, wiki or google-news)"
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Twitter { .. } => "twitter",
            Self::MetOffice { .. } => "met-office",
            Self::Wiki => "wiki",
            Self::GoogleNews => "google-news",
        }
    }
}

/// Result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted(Vec<i64>),
    Upserted(Upsert),
    NothingNew,
}

/// Build the real client for `req` and run it against `store`.
pub async fn run_source(
    cfg: &AppConfig,
    creds: &dyn CredentialSource,
    store: &dyn DocumentStore,
    req: &SourceRequest,
) -> Result<Outcome> {
    let span = tracing::info_span!("aggregate", source = req.name());
    async move {
        info!("Aggregating from {}", req.name());
        let now = chrono::Utc::now().with_timezone(&cfg.timezone);
        match req {
            SourceRequest::Twitter { screen_name, count } => {
                let client = TimelineClient::new(creds)?;
                aggregate_timeline(store, &client, screen_name, *count).await
            }
            SourceRequest::MetOffice { area } => {
                let client = WeatherClient::new(creds)?;
                let locations = cfg.locations()?;
                aggregate_weather(store, &client, &locations, area).await
            }
            SourceRequest::Wiki => {
                let client = WikiClient::new()?;
                aggregate_current_events(store, &client, now.date_naive()).await
            }
            SourceRequest::GoogleNews => {
                let client = NewsClient::new(creds)?;
                let sources = cfg.news_sources()?;
                aggregate_news(store, &client, &sources, now).await
            }
        }
    }
    .instrument(span)
    .await
}

/// Insert posts newer than the highest stored id, oldest first.
pub async fn aggregate_timeline(
    store: &dyn DocumentStore,
    source: &dyn TimelineSource,
    screen_name: &str,
    count: u32,
) -> Result<Outcome> {
    let ns = timeline_namespace(screen_name)?;
    let since_id = store
        .find_latest(&ns, None)
        .await?
        .as_ref()
        .and_then(store::document_id);

    let posts = source.user_timeline(screen_name, since_id, count).await?;
    let fetched = posts.len();
    let mut fresh: Vec<_> = posts
        .into_iter()
        .filter(|p| since_id.map_or(true, |cursor| p.id > cursor))
        .collect();
    info!(source = source.name(), fetched, kept = fresh.len(), ?since_id, "posts retrieved");

    if fresh.is_empty() {
        info!(collection = %ns, "no new posts");
        return Ok(Outcome::NothingNew);
    }

    // Upstream is newest-first.
    fresh.sort_by_key(|p| p.id);
    let docs = fresh.iter().map(to_document).collect::<Result<Vec<_>>>()?;
    let ids = store.insert_many(&ns, docs).await?;
    info!(collection = %ns, inserted = ids.len(), "successfully inserted posts");
    Ok(Outcome::Inserted(ids))
}

/// Insert one forecast poll for `area`; the store assigns the id.
pub async fn aggregate_weather(
    store: &dyn DocumentStore,
    source: &dyn ForecastSource,
    locations: &LocationDirectory,
    area: &str,
) -> Result<Outcome> {
    let ns = weather_namespace()?;
    let at = locations.get(area)?;
    let forecast = source.hourly_forecast(at).await?;
    let sample = WeatherSample {
        id: None,
        area: area.to_string(),
        forecast,
    };
    let id = store.insert_one(&ns, to_document(&sample)?).await?;
    info!(source = source.name(), collection = %ns, id, area, "successfully inserted forecast");
    Ok(Outcome::Inserted(vec![id]))
}

/// Replace-or-insert today's block, keyed by day.
pub async fn aggregate_current_events(
    store: &dyn DocumentStore,
    source: &dyn CurrentEventsSource,
    today: NaiveDate,
) -> Result<Outcome> {
    let ns = current_events_namespace()?;
    let Some(events) = source.current_events(today).await? else {
        info!(source = source.name(), %today, "no section published for today's current events");
        return Ok(Outcome::NothingNew);
    };
    let upsert = store.replace_one_upsert(&ns, to_document(&events)?).await?;
    info!(source = source.name(), collection = %ns, id = events.id, ?upsert, "current events updated");
    Ok(Outcome::Upserted(upsert))
}

/// Fetch articles published after the latest stored batch and store them as one batch.
pub async fn aggregate_news(
    store: &dyn DocumentStore,
    source: &dyn NewsSource,
    sources: &str,
    now: DateTime<Tz>,
) -> Result<Outcome> {
    let ns = news_namespace()?;
    let from = match store.find_latest(&ns, None).await? {
        Some(doc) => news_cursor(&store::from_document::<NewsBatch>(doc)?),
        None => None,
    };
    if let Some(from) = &from {
        info!(from = %from, "set from cursor");
    }

    let rsp = source.everything(sources, from.as_deref()).await?;
    if rsp.status != "ok" {
        info!(
            source = source.name(),
            status = %rsp.status,
            code = rsp.code.as_deref().unwrap_or_default(),
            message = rsp.message.as_deref().unwrap_or_default(),
            "news search returned a non-ok status"
        );
        return Ok(Outcome::NothingNew);
    }
    if rsp.articles.is_empty() {
        info!(source = source.name(), "no new articles");
        return Ok(Outcome::NothingNew);
    }

    let batch = NewsBatch {
        id: batch_id(&now),
        articles: rsp.articles,
    };
    let id = store.insert_one(&ns, to_document(&batch)?).await?;
    info!(
        source = source.name(),
        collection = %ns,
        id,
        articles = batch.articles.len(),
        "successfully inserted news batch"
    );
    Ok(Outcome::Inserted(vec![id]))
}

/// `YYYYMMDDHHMM` of `now`.
pub fn batch_id<T: Datelike + Timelike>(now: &T) -> i64 {
    i64::from(now.year()) * 100_000_000
        + i64::from(now.month()) * 1_000_000
        + i64::from(now.day()) * 10_000
        + i64::from(now.hour()) * 100
        + i64::from(now.minute())
}

/// One second past the newest article in `batch`, as `YYYY-MM-DDTHH:MM:SS`.
pub fn news_cursor(batch: &NewsBatch) -> Option<String> {
    let newest = batch
        .articles
        .iter()
        .filter_map(|a| match parse_published(&a.published_at) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(published_at = %a.published_at, error = %e, "unparseable publish time");
                None
            }
        })
        .max()?;
    Some(
        (newest + ChronoDuration::seconds(1))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
    )
}

fn parse_published(ts: &str) -> Result<NaiveDateTime> {
    if let Ok(t) = DateTime::parse_from_rfc3339(ts) {
        return Ok(t.naive_utc());
    }
    NaiveDateTime::parse_from_str(ts.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| anyhow!("{ts:?}: {e}"))
}
