use serde::{Deserialize, Serialize};

use super::defaults;

/// Entity lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub ema_alpha: f64,
    /// EMA value functional entities start from on load.
    pub functional_neutral_ema: f64,
    /// No dissolution before this many cycles of age.
    pub min_dissolution_age: u64,
    /// Provisional entities become mature no earlier than this age.
    pub mature_age: u64,
    pub promotion_streak: u32,
    pub dissolution_streak: u32,
    /// Robust z of quality needed to count toward promotion.
    pub promote_z: f64,
    /// Robust z (negated) of quality needed to count toward dissolution.
    pub dissolve_z: f64,
    /// Below this cohort size the fallback quality bands apply.
    pub min_cohort_size: usize,
    pub fallback_promote_quality: f64,
    pub fallback_dissolve_quality: f64,
    /// Floor applied to each EMA before the geometric mean.
    pub quality_floor: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            ema_alpha: defaults::DEFAULT_EMA_ALPHA,
            functional_neutral_ema: defaults::DEFAULT_FUNCTIONAL_NEUTRAL_EMA,
            min_dissolution_age: defaults::DEFAULT_MIN_DISSOLUTION_AGE,
            mature_age: defaults::DEFAULT_MATURE_AGE,
            promotion_streak: defaults::DEFAULT_PROMOTION_STREAK,
            dissolution_streak: defaults::DEFAULT_DISSOLUTION_STREAK,
            promote_z: defaults::DEFAULT_PROMOTE_Z,
            dissolve_z: defaults::DEFAULT_DISSOLVE_Z,
            min_cohort_size: defaults::DEFAULT_MIN_COHORT_SIZE,
            fallback_promote_quality: defaults::DEFAULT_FALLBACK_PROMOTE_QUALITY,
            fallback_dissolve_quality: defaults::DEFAULT_FALLBACK_DISSOLVE_QUALITY,
            quality_floor: defaults::DEFAULT_QUALITY_FLOOR,
        }
    }
}
