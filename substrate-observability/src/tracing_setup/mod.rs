//! Subscriber setup and span definitions.

pub mod spans;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use substrate_core::config::ObservabilityConfig;
use substrate_core::errors::{SubstrateError, SubstrateResult};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> SubstrateResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            SubstrateError::ConfigError(format!("invalid log level `{}`: {e}", config.log_level))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logs {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };
    Ok(installed)
}
