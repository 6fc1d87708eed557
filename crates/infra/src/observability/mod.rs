//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level so a single run can be made
//! noisier without touching the config file.

use taxdesk_domain::{LogFormat, LoggingConfig};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Build the filter from `RUST_LOG`, falling back to the configured level
///
/// An unparsable level degrades to `info`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber
///
/// Returns `false` if a subscriber was already installed (tests, embedding
/// applications); the existing one is kept.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = env_filter(config);

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
    };

    let installed = result.is_ok();
    if installed {
        tracing::debug!(level = %config.level, format = %config.format, "Tracing initialized");
    }
    installed
}
