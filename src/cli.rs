//! `key=value` argument parsing shared by both binaries.
//!
//! ```text
//! morning-digest source=twitter screen_name=northernline count=5
//! morning-digest source=met-office area=goodge_street
//! morning-digest source=wiki
//! morning-digest source=google-news
//! digest config=morning.json transport=relay
//! ```

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueArgs {
    values: BTreeMap<String, String>,
}

impl KeyValueArgs {
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = BTreeMap::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, value)) = arg.split_once('=') else {
                bail!("malformed argument {arg:?}: expected key=value");
            };
            let key = key.trim();
            if key.is_empty() {
                bail!("malformed argument {arg:?}: empty key");
            }
            if values.insert(key.to_string(), value.trim().to_string()).is_some() {
                bail!("argument {key:?} given more than once");
            }
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| anyhow!("missing required argument {key}=..."))
    }

    pub fn parse_value<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.get(key)
            .map(|v| v.parse::<T>().with_context(|| format!("invalid value for {key}: {v:?}")))
            .transpose()
    }

    /// Keys present but not in `known`.
    pub fn unknown_keys<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| !known.contains(k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs() {
        let args =
            KeyValueArgs::parse(["source=twitter", "screen_name=northernline", "count=5"]).unwrap();
        assert_eq!(args.get("source"), Some("twitter"));
        assert_eq!(args.parse_value::<u32>("count").unwrap(), Some(5));
        assert_eq!(args.parse_value::<u32>("missing").unwrap(), None);
        assert!(args.unknown_keys(&["source", "screen_name", "count"]).is_empty());
    }

    #[test]
    fn rejects_malformed() {
        assert!(KeyValueArgs::parse(["source"]).is_err());
        assert!(KeyValueArgs::parse(["=x"]).is_err());
        assert!(KeyValueArgs::parse(["a=1", "a=2"]).is_err());
        let args = KeyValueArgs::parse(["count=five"]).unwrap();
        assert!(args.parse_value::<u32>("count").is_err());
        assert!(args.require("source").is_err());
    }
}
