// src/ingest/providers/wiki.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::time::Duration;

use crate::html;
use crate::ingest::types::{CurrentEvents, CurrentEventsSource};

pub const DEFAULT_PAGE_URL: &str = "https://en.m.wikipedia.org/wiki/Portal:Current_events";

/// `YYYYMMDD` key shared by the aggregator and the digest lookup.
pub fn day_id(day: NaiveDate) -> i64 {
    i64::from(day.year()) * 10_000 + i64::from(day.month()) * 100 + i64::from(day.day())
}

/// Element id of the day's block on the portal page, e.g. `2026_October_18`.
pub fn block_id(day: NaiveDate) -> String {
    day.format("%Y_%B_%-d").to_string()
}

/// Pull the day's block out of the portal page, links reduced to their text.
pub fn extract_current_events(page: &str, day: NaiveDate) -> Option<CurrentEvents> {
    let page = html::unwrap_anchors(page);
    let block = html::element_by_id(&page, &block_id(day))?;
    let inner = html::inner_html(block);
    let text = match html::last_child_element(inner) {
        Some(child) => html::inner_html(child),
        None => inner,
    };
    Some(CurrentEvents {
        id: day_id(day),
        date: day.format("%-d %b %Y").to_string(),
        text: text.trim().to_string(),
    })
}

pub struct WikiClient {
    page_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl WikiClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            client: super::http_client()?,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn with_page_url(mut self, url: &str) -> Self {
        self.page_url = url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CurrentEventsSource for WikiClient {
    async fn current_events(&self, today: NaiveDate) -> Result<Option<CurrentEvents>> {
        let page = self
            .client
            .get(&self.page_url)
            .timeout(self.timeout)
            .send()
            .await
            .context("wiki http get()")?
            .error_for_status()
            .context("wiki non-2xx")?
            .text()
            .await
            .context("wiki http .text()")?;
        Ok(extract_current_events(&page, today))
    }

    fn name(&self) -> &'static str {
        "wiki"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_for_single_digit_days() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(day_id(d), 20261001);
        assert_eq!(block_id(d), "2026_October_1");
    }

    #[test]
    fn extracts_last_child_without_links() {
        let page = r#"<div id="2026_October_18" class="vevent">
<div class="current-events-heading"><span>October 18, 2026</span></div>
<div class="current-events-content description"><p><b>Arts</b></p>
<ul><li>The <a href="/wiki/Prize" title="Prize">Prize</a> is awarded.</li></ul></div>
</div>"#;
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let ev = extract_current_events(page, day).unwrap();
        assert_eq!(ev.id, 20261018);
        assert_eq!(ev.date, "18 Oct 2026");
        assert!(ev.text.starts_with("<p><b>Arts</b></p>"));
        assert!(ev.text.contains("The Prize is awarded."));
        assert!(!ev.text.contains("<a"));
        assert!(!ev.text.contains("October 18, 2026"));
    }

    #[test]
    fn missing_day_is_none() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(extract_current_events("<div id=\"2026_October_18\"></div>", day).is_none());
    }
}
