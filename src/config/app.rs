// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use std::{env, fs, path::PathBuf};

use super::credentials::FileCredentials;
use super::locations::LocationDirectory;

pub const ENV_CONFIG_DIR: &str = "DIGEST_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "DIGEST_DATA_DIR";
pub const ENV_KEYS_DIR: &str = "DIGEST_KEYS_DIR";
pub const ENV_TIMEZONE: &str = "DIGEST_TIMEZONE";

const DEFAULT_CONFIG_DIR: &str = "configs";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TIMEZONE: &str = "Europe/London";

/// Process-level settings shared by both jobs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Holds `location.json`, `google_news_sources` and digest configs.
    pub config_dir: PathBuf,
    /// Root of the file-backed document store.
    pub data_dir: PathBuf,
    /// Root of the per-service secret files.
    pub keys_dir: PathBuf,
    /// Local timezone for target hours, day keys and subject lines.
    pub timezone: Tz,
}

impl AppConfig {
    /// Read `DIGEST_*` variables (a `.env` is loaded by the binaries first).
    pub fn from_env() -> Result<Self> {
        let config_dir = env::var(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));
        let data_dir = env::var(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let keys_dir = match env::var(ENV_KEYS_DIR) {
            Ok(p) => PathBuf::from(p),
            Err(_) => {
                let home = env::var("HOME")
                    .map_err(|_| anyhow!("neither {ENV_KEYS_DIR} nor HOME is set"))?;
                PathBuf::from(home).join("keys")
            }
        };
        let tz_name = env::var(ENV_TIMEZONE).unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let timezone = parse_timezone(&tz_name)?;

        Ok(Self {
            config_dir,
            data_dir,
            keys_dir,
            timezone,
        })
    }

    pub fn credentials(&self) -> FileCredentials {
        FileCredentials::new(&self.keys_dir)
    }

    pub fn locations(&self) -> Result<LocationDirectory> {
        LocationDirectory::load_from(&self.config_dir.join("location.json"))
    }

    /// Comma-separated source ids allowed for the news search.
    pub fn news_sources(&self) -> Result<String> {
        let path = self.config_dir.join("google_news_sources");
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading news sources from {}", path.display()))?;
        Ok(raw.trim().to_string())
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow!("invalid timezone {name:?}: {e}"))
}
