use serde::{Deserialize, Serialize};

use super::defaults;

/// Logging and telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs.
    pub json_logs: bool,
    /// Bounded capacity of the telemetry channel.
    pub telemetry_capacity: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            telemetry_capacity: defaults::DEFAULT_TELEMETRY_CAPACITY,
        }
    }
}
