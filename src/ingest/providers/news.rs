// src/ingest/providers/news.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use crate::config::CredentialSource;
use crate::ingest::types::{NewsResponse, NewsSource};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Wait before the single retry that follows a read timeout.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(300);

pub struct NewsClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
    retry_backoff: Duration,
}

impl NewsClient {
    pub fn new(creds: &dyn CredentialSource) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: creds.secret("news-api", "api_key")?,
            client: super::http_client()?,
            timeout: Duration::from_secs(30),
            retry_backoff: RETRY_BACKOFF,
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

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn search(
        &self,
        sources: &str,
        from: Option<&str>,
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let mut params = vec![("sources", sources), ("language", "en")];
        if let Some(from) = from {
            params.push(("from", from));
        }
        let rsp = self
            .client
            .get(format!("{}/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = rsp.status();
        Ok((status, rsp.text().await?))
    }
}

/// Non-2xx responses are errors, carrying the upstream code and message when present.
fn parse_response(status: StatusCode, body: &str) -> Result<NewsResponse> {
    let parsed = serde_json::from_str::<NewsResponse>(body);
    if !status.is_success() {
        let detail = match &parsed {
            Ok(r) => format!(
                "{}: {}",
                r.code.as_deref().unwrap_or("unknown"),
                r.message.as_deref().unwrap_or_default()
            ),
            Err(_) => body.chars().take(200).collect(),
        };
        bail!("news search failed with HTTP {status}: {detail}");
    }
    parsed.context("news body")
}

#[async_trait]
impl NewsSource for NewsClient {
    async fn everything(&self, sources: &str, from: Option<&str>) -> Result<NewsResponse> {
        let (status, body) = match self.search(sources, from).await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                tracing::warn!(
                    backoff_secs = self.retry_backoff.as_secs(),
                    "news search timed out, retrying once"
                );
                tokio::time::sleep(self.retry_backoff).await;
                self.search(sources, from)
                    .await
                    .context("news search retry")?
            }
            Err(e) => return Err(e).context("news search"),
        };
        parse_response(status, &body)
    }

    fn name(&self) -> &'static str {
        "google-news"
    }
}
