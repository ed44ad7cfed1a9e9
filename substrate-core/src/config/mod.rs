pub mod activation_config;
pub mod decay_config;
pub mod defaults;
pub mod engine_config;
pub mod learning_config;
pub mod lifecycle_config;
pub mod observability_config;
pub mod safety_config;
pub mod storage_config;

use serde::{Deserialize, Serialize};

pub use activation_config::ActivationConfig;
pub use decay_config::DecayConfig;
pub use engine_config::EngineConfig;
pub use learning_config::LearningConfig;
pub use lifecycle_config::LifecycleConfig;
pub use observability_config::ObservabilityConfig;
pub use safety_config::{Band, SafetyConfig};
pub use storage_config::{BackendKind, StorageConfig};

use crate::errors::{SubstrateError, SubstrateResult};

/// Top-level configuration. Every section falls back to its defaults,
/// so an empty TOML document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateConfig {
    pub engine: EngineConfig,
    pub activation: ActivationConfig,
    pub decay: DecayConfig,
    pub learning: LearningConfig,
    pub lifecycle: LifecycleConfig,
    pub safety: SafetyConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl SubstrateConfig {
    /// Parse a TOML document, filling omitted fields with defaults.
    pub fn from_toml(source: &str) -> SubstrateResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| SubstrateError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> SubstrateResult<String> {
        toml::to_string(self).map_err(|e| SubstrateError::ConfigError(e.to_string()))
    }

    /// Reject values that would make the engine's math meaningless.
    pub fn validate(&self) -> SubstrateResult<()> {
        let alpha = self.learning.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SubstrateError::ConfigError(format!(
                "learning.ema_alpha must be in (0, 1], got {alpha}"
            )));
        }
        if self.learning.eta_min > self.learning.eta_max {
            return Err(SubstrateError::ConfigError(
                "learning.eta_min exceeds learning.eta_max".to_string(),
            ));
        }
        let learning = &self.learning;
        if !(learning.global_share > 0.0 && learning.global_share <= 1.0)
            || !(0.0..=1.0).contains(&learning.overlay_share)
        {
            return Err(SubstrateError::ConfigError(
                "learning.global_share must be in (0, 1] and learning.overlay_share in [0, 1]"
                    .to_string(),
            ));
        }
        if !(learning.overlay_cap >= 0.0) {
            return Err(SubstrateError::ConfigError(format!(
                "learning.overlay_cap must be non-negative, got {}",
                learning.overlay_cap
            )));
        }
        if !(0.0..=1.0).contains(&self.activation.spread_fraction) {
            return Err(SubstrateError::ConfigError(format!(
                "activation.spread_fraction must be in [0, 1], got {}",
                self.activation.spread_fraction
            )));
        }
        if self.engine.tick_interval_ms == 0 {
            return Err(SubstrateError::ConfigError(
                "engine.tick_interval_ms must be positive".to_string(),
            ));
        }
        self.safety.validate()
    }
}
