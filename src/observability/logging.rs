//! # Logging
//!
//! `tracing` subscriber setup. `RUST_LOG` takes precedence over the
//! configured log level.

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
pub fn init_logging(log_level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}")),
        LogFormat::Text => builder
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}")),
    }
}
