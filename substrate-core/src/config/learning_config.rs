use serde::{Deserialize, Serialize};

use super::defaults;

/// Weight-learning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// EMA smoothing factor for usage statistics.
    pub ema_alpha: f64,
    /// Cohorts smaller than this fall back to the raw EMA as z.
    pub min_cohort_size: usize,
    pub eta_min: f64,
    pub eta_max: f64,
    /// Learning rate for a record's first update, before any interval is known.
    pub first_update_eta: f64,
    /// Share of each update applied to the global `log_weight`.
    pub global_share: f64,
    /// Share applied to the overlays of active entities the record belongs
    /// to, scaled by membership.
    pub overlay_share: f64,
    /// Overlays are clamped to `[-overlay_cap, overlay_cap]`.
    pub overlay_cap: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            ema_alpha: defaults::DEFAULT_EMA_ALPHA,
            min_cohort_size: defaults::DEFAULT_MIN_COHORT_SIZE,
            eta_min: defaults::DEFAULT_ETA_MIN,
            eta_max: defaults::DEFAULT_ETA_MAX,
            first_update_eta: defaults::DEFAULT_FIRST_UPDATE_ETA,
            global_share: defaults::DEFAULT_GLOBAL_SHARE,
            overlay_share: defaults::DEFAULT_OVERLAY_SHARE,
            overlay_cap: defaults::DEFAULT_OVERLAY_CAP,
        }
    }
}
