// src/config/digest.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_travel_keyword() -> String {
    "Northern Line".to_string()
}

/// One digest profile (`configs/morning.json`, `configs/evening.toml`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    /// Areas to report, each with the local hour of interest.
    pub weather: Vec<AreaHour>,
    pub twitter: TwitterSection,
    /// Number of headlines to include.
    pub articles: usize,
    /// Posts must contain this marker to count as travel updates.
    #[serde(default = "default_travel_keyword")]
    pub travel_keyword: String,
    /// Prefix the Travel section with a live journey-time lookup.
    #[serde(default)]
    pub journey: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterSection {
    pub screen_name: String,
    pub tweet_count: usize,
}

/// `{"goodge_street": 8}` — an area name with its target hour (0..=23).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>")]
pub struct AreaHour {
    pub area: String,
    pub hour: u32,
}

impl TryFrom<BTreeMap<String, u32>> for AreaHour {
    type Error = String;

    fn try_from(map: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "weather entries need exactly one area, got {}",
                map.len()
            ));
        }
        let Some((area, hour)) = map.into_iter().next() else {
            return Err("empty weather entry".to_string());
        };
        if hour > 23 {
            return Err(format!("hour {hour} for {area} is out of range"));
        }
        Ok(Self { area, hour })
    }
}

impl DigestConfig {
    /// Load a profile; TOML when the extension says so, JSON otherwise.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = Self::parse(&content, &ext)
            .with_context(|| format!("parsing digest config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        if hint_ext == "toml" {
            return toml::from_str(s).map_err(|e| anyhow!("{e}"));
        }
        serde_json::from_str(s).map_err(|e| anyhow!("{e}"))
    }

    fn validate(&self) -> Result<()> {
        if self.twitter.screen_name.trim().is_empty() {
            bail!("twitter.screen_name must not be empty");
        }
        Ok(())
    }

    /// Earliest and latest configured areas, as journey start and end.
    /// On equal hours the first listed area wins.
    pub fn journey_endpoints(&self) -> Option<(&AreaHour, &AreaHour)> {
        let mut areas = self.weather.iter();
        let first = areas.next()?;
        Some(areas.fold((first, first), |(start, end), a| {
            (
                if a.hour < start.hour { a } else { start },
                if a.hour > end.hour { a } else { end },
            )
        }))
    }
}
