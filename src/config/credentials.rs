//! # Credentials
//! Per-service secrets behind the [`CredentialSource`] trait.
//!
//! Secrets are addressed by `(service, name)`, e.g. `("met-office", "client-id")`.
//! - [`FileCredentials`] reads `<root>/<service>/<name>`, with an environment
//!   override `DIGEST_SECRET_<SERVICE>_<NAME>` (non-alphanumerics → `_`).
//! - [`StaticCredentials`] is an in-memory map for tests and tools.
//!
//! A missing secret is an error; callers resolve every secret they need
//! before doing any network work.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait CredentialSource: Send + Sync {
    fn secret(&self, service: &str, name: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FileCredentials {
    root: PathBuf,
}

impl FileCredentials {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

pub fn env_key(service: &str, name: &str) -> String {
    let mut key = String::from("DIGEST_SECRET_");
    for c in format!("{service}_{name}").chars() {
        key.push(if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        });
    }
    key
}

impl CredentialSource for FileCredentials {
    fn secret(&self, service: &str, name: &str) -> Result<String> {
        if let Ok(v) = std::env::var(env_key(service, name)) {
            return Ok(v.trim_end_matches(['\r', '\n']).to_string());
        }
        let path = self.root.join(service).join(name);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("missing credential {service}/{name} at {}", path.display()))?;
        let value = raw.trim_end_matches(['\r', '\n']).to_string();
        if value.is_empty() {
            return Err(anyhow!("credential {service}/{name} is empty"));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<(String, String), String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, service: &str, name: &str, value: &str) -> Self {
        self.values
            .insert((service.to_string(), name.to_string()), value.to_string());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn secret(&self, service: &str, name: &str) -> Result<String> {
        self.values
            .get(&(service.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("missing credential {service}/{name}"))
    }
}
