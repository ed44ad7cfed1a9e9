use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::{SubstrateError, SubstrateResult};

/// A warning/critical pair for one indicator.
///
/// Whether larger or smaller values are worse is a property of the
/// indicator, so the band itself only stores the two edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub warning: f64,
    pub critical: f64,
}

impl Band {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// Safety monitor configuration. Bands are operating targets, not constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Number of previous active sets compared for repetition.
    pub repetition_window: usize,
    /// Repetition score (higher is worse).
    pub repetition: Band,
    /// |ΔE| / E_before across one cycle (higher is worse).
    pub energy_change: Band,
    /// Normalized Shannon entropy of energy (lower is worse).
    pub energy_entropy: Band,
    /// Nodes plus links created in the trailing growth window (higher is worse).
    pub growth_count: Band,
    /// Fitted exponential growth rate per hour (higher is worse).
    pub growth_rate: Band,
    pub growth_window_secs: i64,
    pub growth_fit_min_samples: usize,
    pub growth_fit_min_span_secs: i64,
    /// Fraction of nodes with no current links (higher is worse).
    pub isolated_fraction: Band,
    /// Weakly connected components per node (higher is worse).
    pub component_ratio: Band,
    /// Fraction of nodes above the hub cutoff (higher is worse).
    pub hub_fraction: Band,
    /// k in `median + k·MAD` of degree for the hub cutoff.
    pub hub_mad_k: f64,
    /// Mechanism success rate over the rolling window (lower is worse).
    pub mechanism_success: Band,
    /// Mechanism latency in milliseconds (higher is worse).
    pub mechanism_latency_ms: Band,
    /// Consecutive missed scheduled runs (higher is worse).
    pub missed_runs: Band,
    pub mechanism_window: usize,
    /// Success rate is only judged once this many runs are recorded.
    pub mechanism_min_runs: usize,
    /// Snapshot samples retained for growth fitting.
    pub history_capacity: usize,
}

impl SafetyConfig {
    pub fn validate(&self) -> SubstrateResult<()> {
        let higher_is_worse = [
            ("repetition", self.repetition),
            ("energy_change", self.energy_change),
            ("growth_count", self.growth_count),
            ("growth_rate", self.growth_rate),
            ("isolated_fraction", self.isolated_fraction),
            ("component_ratio", self.component_ratio),
            ("hub_fraction", self.hub_fraction),
            ("mechanism_latency_ms", self.mechanism_latency_ms),
            ("missed_runs", self.missed_runs),
        ];
        for (name, band) in higher_is_worse {
            if band.warning > band.critical {
                return Err(SubstrateError::ConfigError(format!(
                    "safety.{name}: warning edge {} above critical edge {}",
                    band.warning, band.critical
                )));
            }
        }
        for (name, band) in [
            ("energy_entropy", self.energy_entropy),
            ("mechanism_success", self.mechanism_success),
        ] {
            if band.warning < band.critical {
                return Err(SubstrateError::ConfigError(format!(
                    "safety.{name}: warning edge {} below critical edge {}",
                    band.warning, band.critical
                )));
            }
        }
        if self.repetition_window == 0 {
            return Err(SubstrateError::ConfigError(
                "safety.repetition_window must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            repetition_window: defaults::DEFAULT_REPETITION_WINDOW,
            repetition: Band::new(0.8, 0.95),
            energy_change: Band::new(0.25, 0.5),
            energy_entropy: Band::new(0.3, 0.1),
            growth_count: Band::new(1_000.0, 2_000.0),
            growth_rate: Band::new(0.7, 1.4),
            growth_window_secs: defaults::DEFAULT_GROWTH_WINDOW_SECS,
            growth_fit_min_samples: defaults::DEFAULT_GROWTH_FIT_MIN_SAMPLES,
            growth_fit_min_span_secs: defaults::DEFAULT_GROWTH_FIT_MIN_SPAN_SECS,
            isolated_fraction: Band::new(0.1, 0.2),
            component_ratio: Band::new(0.15, 0.3),
            hub_fraction: Band::new(0.1, 0.25),
            hub_mad_k: defaults::DEFAULT_HUB_MAD_K,
            mechanism_success: Band::new(0.9, 0.5),
            mechanism_latency_ms: Band::new(1_000.0, 10_000.0),
            missed_runs: Band::new(1.0, 2.0),
            mechanism_window: defaults::DEFAULT_MECHANISM_WINDOW,
            mechanism_min_runs: defaults::DEFAULT_MECHANISM_MIN_RUNS,
            history_capacity: defaults::DEFAULT_HISTORY_CAPACITY,
        }
    }
}
