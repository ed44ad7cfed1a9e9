use serde::{Deserialize, Serialize};

use super::defaults;

/// Activation and traversal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Lower bound on any node threshold.
    pub threshold_floor: f64,
    /// k in `median + k·MAD` for node thresholds.
    pub threshold_mad_k: f64,
    /// Fraction of a node's surplus spent on strides each cycle.
    pub spread_fraction: f64,
    /// Hard cap on strides from one source per cycle.
    pub max_strides_per_node: usize,
    /// Remaining budget below which a sub-traversal counts as depleted.
    pub min_stride_energy: f64,
    /// Working-memory capacity in nodes.
    pub wm_capacity: usize,
    /// k in `median + k·MAD` for entity thresholds.
    pub entity_threshold_mad_k: f64,
    pub entity_threshold_floor: f64,
    /// Hops of neighbourhood spill for node stimuli.
    pub spill_hops: usize,
    /// Fraction of the injected amount passed on per hop.
    pub spill_decay: f64,
    /// Nodes receiving energy from an embedding stimulus.
    pub embedding_top_k: usize,
    /// Cohorts smaller than this use raw values instead of rank scores.
    pub min_cohort_size: usize,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            threshold_floor: defaults::DEFAULT_THRESHOLD_FLOOR,
            threshold_mad_k: defaults::DEFAULT_THRESHOLD_MAD_K,
            spread_fraction: defaults::DEFAULT_SPREAD_FRACTION,
            max_strides_per_node: defaults::DEFAULT_MAX_STRIDES_PER_NODE,
            min_stride_energy: defaults::DEFAULT_MIN_STRIDE_ENERGY,
            wm_capacity: defaults::DEFAULT_WM_CAPACITY,
            entity_threshold_mad_k: defaults::DEFAULT_ENTITY_THRESHOLD_MAD_K,
            entity_threshold_floor: defaults::DEFAULT_ENTITY_THRESHOLD_FLOOR,
            spill_hops: defaults::DEFAULT_SPILL_HOPS,
            spill_decay: defaults::DEFAULT_SPILL_DECAY,
            embedding_top_k: defaults::DEFAULT_EMBEDDING_TOP_K,
            min_cohort_size: defaults::DEFAULT_MIN_COHORT_SIZE,
        }
    }
}
