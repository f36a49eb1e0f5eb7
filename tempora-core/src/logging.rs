//! Logging initialisation shared by the CLI and the test harness

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{TemporaError, TemporaResult};

/// Install the global fmt subscriber. `TEMPORA_LOG` overrides the configured level and
/// `RUST_LOG` overrides both.
pub fn init_logging(config: &LoggingConfig) -> TemporaResult<()> {
    let log_level = std::env::var("TEMPORA_LOG").unwrap_or_else(|_| config.level.clone());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_target(config.with_target)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| TemporaError::Configuration(format!("Failed to install logger: {}", e)))
}

/// Initialize test logging (safe to call from every test)
pub fn init_test_logging() {
    let log_level = std::env::var("TEMPORA_LOG").unwrap_or_else(|_| "warn".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_test_writer()
        .try_init();
}
