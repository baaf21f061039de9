//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use trellis_core::{LoggingConfig, Result, TrellisError};

/// Install a global fmt subscriber configured from `config`
///
/// `RUST_LOG` is not consulted; the configured level is the filter directive.
///
/// # Errors
///
/// Returns a configuration error if the level is not a valid filter
/// directive, or if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| TrellisError::config(format!("Invalid log level '{}': {e}", config.level)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| TrellisError::config(format!("Failed to install tracing subscriber: {e}")))
}
