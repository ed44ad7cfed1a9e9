use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Decay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Energy decay rate per second before the type multiplier.
    pub base_energy_rate: f64,
    /// Log-weight decay per second before the type multiplier.
    pub weight_rate: f64,
    /// Weight decay runs every N cycles.
    pub weight_decay_every_n_cycles: u64,
    /// Linear weight below which a record counts as dormant.
    pub dormant_weight: f64,
    /// Per-type multiplier. Key is the node type name.
    pub type_multipliers: BTreeMap<String, f64>,
}

impl DecayConfig {
    /// Multiplier for a type, 1.0 when the type has no entry.
    pub fn multiplier(&self, type_name: &str) -> f64 {
        self.type_multipliers.get(type_name).copied().unwrap_or(1.0)
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        let type_multipliers = [
            ("memory", 0.5),
            ("concept", 1.0),
            ("principle", 0.5),
            ("realization", 1.5),
            ("task", 5.0),
            ("goal", 0.5),
            ("person", 0.5),
            ("mechanism", 1.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            base_energy_rate: defaults::DEFAULT_BASE_ENERGY_DECAY_RATE,
            weight_rate: defaults::DEFAULT_WEIGHT_DECAY_RATE,
            weight_decay_every_n_cycles: defaults::DEFAULT_WEIGHT_DECAY_EVERY_N_CYCLES,
            dormant_weight: defaults::DEFAULT_DORMANT_WEIGHT,
            type_multipliers,
        }
    }
}
