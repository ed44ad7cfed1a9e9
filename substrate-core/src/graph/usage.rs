use serde::{Deserialize, Serialize};

/// Smoothed usage statistics carried by every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub ema_reinforcement: f64,
    pub ema_wm_presence: f64,
    pub ema_formation_quality: f64,
    pub ema_activation: f64,
    /// Seconds between weight updates.
    pub ema_update_interval: f64,
    pub update_count: u64,
}

/// Smoothed usage statistics carried by every link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub ema_reinforcement: f64,
    pub ema_formation_quality: f64,
    pub ema_gap_closure: f64,
    pub ema_flow: f64,
    /// Seconds between weight updates.
    pub ema_update_interval: f64,
    pub update_count: u64,
}

/// The five signals whose geometric mean is an entity's quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    pub ema_active: f64,
    pub ema_coherence: f64,
    pub ema_wm_presence: f64,
    pub ema_reinforcement: f64,
    pub ema_formation_quality: f64,
}

impl EntityStats {
    /// Every signal set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            ema_active: value,
            ema_coherence: value,
            ema_wm_presence: value,
            ema_reinforcement: value,
            ema_formation_quality: value,
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.ema_active,
            self.ema_coherence,
            self.ema_wm_presence,
            self.ema_reinforcement,
            self.ema_formation_quality,
        ]
    }
}
