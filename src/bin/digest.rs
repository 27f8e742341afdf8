//! Digest entrypoint: compose the HTML digest from stored data and mail it.
//!
//! ```text
//! digest config=morning.json [transport=relay|direct-tls]
//! ```

use anyhow::{Context, Result};
use tracing::{info, warn, Instrument};

use morning_digest::cli::KeyValueArgs;
use morning_digest::digest::compose;
use morning_digest::ingest::providers::transit::TransitClient;
use morning_digest::logging::init_tracing;
use morning_digest::{AppConfig, DigestConfig, FileStore, Mailer, TransportProfile};

const KNOWN_ARGS: &[&str] = &["config", "transport"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = KeyValueArgs::parse(std::env::args().skip(1))?;
    for key in args.unknown_keys(KNOWN_ARGS) {
        warn!(key, "ignoring unknown argument");
    }
    let config_name = args
        .get("config")
        .context("You need to pass a command line argument e.g. config=morning.json")?;
    let transport = match args.get("transport") {
        Some(t) => t.parse::<TransportProfile>()?,
        None => TransportProfile::default(),
    };

    let span = tracing::info_span!("digest", config = config_name);
    run(config_name, transport).instrument(span).await
}

async fn run(config_name: &str, transport: TransportProfile) -> Result<()> {
    let cfg = AppConfig::from_env()?;
    let digest_cfg = DigestConfig::load_from(&cfg.config_dir.join(config_name))?;
    let creds = cfg.credentials();
    // Resolve mail secrets before any network work.
    let mailer = Mailer::new(&creds, transport)?;
    let store = FileStore::new(cfg.data_dir.clone());

    let now = chrono::Utc::now().with_timezone(&cfg.timezone);
    let journey = if digest_cfg.journey {
        let transit = TransitClient::new(&creds, cfg.locations()?)?;
        transit
            .journey_info(&digest_cfg, now.date_naive(), cfg.timezone)
            .await?
    } else {
        None
    };

    let html = compose(&store, &digest_cfg, now, journey.as_ref()).await?;
    info!(bytes = html.len(), ?transport, "digest composed");
    mailer.send(&html, &now).await
}
