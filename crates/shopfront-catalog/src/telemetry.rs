//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::config::{CatalogConfig, LogFormat};

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG` wins over `config.log_level` when set. Safe to call multiple
/// times; returns `false` when a subscriber was already installed.
pub fn init(config: &CatalogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.compact().try_init(),
    };

    installed.is_ok()
}
