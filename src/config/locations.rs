// src/config/locations.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// `"lat,long"` as the transit API expects it.
    pub fn as_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Named places (`goodge_street`, ...) → coordinates, from `location.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LocationDirectory {
    places: BTreeMap<String, Coordinates>,
}

impl LocationDirectory {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading location directory from {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parsing location directory")
    }

    pub fn get(&self, name: &str) -> Result<Coordinates> {
        self.places
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown location {name:?}"))
    }
}
