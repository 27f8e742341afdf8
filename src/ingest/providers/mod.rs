// src/ingest/providers/mod.rs
pub mod news;
pub mod timeline;
pub mod transit;
pub mod weather;
pub mod wiki;

use anyhow::{Context, Result};
use std::time::Duration;

pub(crate) const USER_AGENT: &str = "morning-digest/0.1 (personal aggregator)";

/// Per-request timeouts are set by each client; this only fixes UA and connect timeout.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4))
        .build()
        .context("build http client")
}
