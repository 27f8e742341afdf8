use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging for one job invocation.
///
/// Call once at startup from each binary; `RUST_LOG` overrides the default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (e.g. from tests) is not an error worth failing on.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
