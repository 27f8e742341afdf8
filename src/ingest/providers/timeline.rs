// src/ingest/providers/timeline.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::CredentialSource;
use crate::ingest::types::{SocialPost, TimelineSource};

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/1.1";

/// Upstream fields dropped before storage.
const STRIPPED_FIELDS: &[&str] = &["id_str", "truncated", "display_text_range", "user"];

pub struct TimelineClient {
    base_url: String,
    bearer_token: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl TimelineClient {
    pub fn new(creds: &dyn CredentialSource) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: creds.secret("twitter", "bearer_token")?,
            client: super::http_client()?,
            timeout: Duration::from_secs(10),
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

/// Strip redundant fields and move `id` to `_id`.
pub fn clean_status(mut status: Map<String, Value>) -> Result<SocialPost> {
    let id = status
        .remove("id")
        .ok_or_else(|| anyhow!("status without id"))?;
    status.insert("_id".to_string(), id);
    for key in STRIPPED_FIELDS {
        status.remove(*key);
    }
    serde_json::from_value(Value::Object(status)).context("status shape")
}

#[async_trait]
impl TimelineSource for TimelineClient {
    async fn user_timeline(
        &self,
        screen_name: &str,
        since_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<SocialPost>> {
        let mut params = vec![
            ("screen_name", screen_name.to_string()),
            ("count", count.to_string()),
            ("tweet_mode", "extended".to_string()),
        ];
        if let Some(id) = since_id {
            params.push(("since_id", id.to_string()));
        }

        let statuses: Vec<Map<String, Value>> = self
            .client
            .get(format!("{}/statuses/user_timeline.json", self.base_url))
            .bearer_auth(&self.bearer_token)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .context("timeline http get()")?
            .error_for_status()
            .context("timeline non-2xx")?
            .json()
            .await
            .context("timeline body")?;

        statuses.into_iter().map(clean_status).collect()
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}
