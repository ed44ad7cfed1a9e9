use serde::{Deserialize, Serialize};

use super::defaults;

/// Cycle loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nominal duration of one cycle (milliseconds). Used as Δt for the first cycle
    /// and as the sleep interval of the async driver.
    pub tick_interval_ms: u64,
    /// Upper bound on queued stimuli drained per cycle.
    pub max_stimuli_per_cycle: usize,
    /// Agent or process name recorded as `created_by` on formations.
    pub agent_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::DEFAULT_TICK_INTERVAL_MS,
            max_stimuli_per_cycle: defaults::DEFAULT_MAX_STIMULI_PER_CYCLE,
            agent_name: "substrate".to_string(),
        }
    }
}
