//! Aggregator entrypoint: pull one source into the document store.
//!
//! ```text
//! morning-digest source=twitter screen_name=northernline [count=20]
//! morning-digest source=met-office area=goodge_street
//! morning-digest source=wiki
//! morning-digest source=google-news
//! ```

use anyhow::Result;
use tracing::{error, info, warn};

use morning_digest::cli::KeyValueArgs;
use morning_digest::logging::init_tracing;
use morning_digest::{run_source, AppConfig, FileStore, Outcome, SourceRequest};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env when present; absent in scheduled runs.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = KeyValueArgs::parse(std::env::args().skip(1))?;
    for key in args.unknown_keys(SourceRequest::KNOWN_ARGS) {
        warn!(key, "ignoring unknown argument");
    }
    let req = SourceRequest::from_args(&args)?;

    let cfg = AppConfig::from_env()?;
    let creds = cfg.credentials();
    let store = FileStore::new(cfg.data_dir.clone());

    match run_source(&cfg, &creds, &store, &req).await {
        Ok(Outcome::NothingNew) => info!(source = req.name(), "nothing new"),
        Ok(outcome) => info!(source = req.name(), ?outcome, "aggregation finished"),
        Err(e) => {
            error!(source = req.name(), error = ?e, "aggregation failed");
            return Err(e);
        }
    }
    Ok(())
}
