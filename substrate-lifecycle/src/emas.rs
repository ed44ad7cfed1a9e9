//! Per-cycle refresh of the five entity EMAs.

use substrate_core::config::LifecycleConfig;
use substrate_core::graph::EntityStats;
use substrate_core::stats::ema;
use substrate_core::{Entity, GraphState};

/// This cycle's raw observations for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityObservation {
    pub active: f64,
    pub coherence: f64,
    pub wm_presence: f64,
    pub reinforcement: f64,
    /// Mean formation quality of members formed this cycle, if any were.
    pub formation_quality: Option<f64>,
}

/// Internal links over all live links touching a member. 0 with no links.
fn coherence(state: &GraphState, entity: &Entity) -> f64 {
    let mut touching = 0usize;
    let mut internal = 0usize;
    for link in state.live_links() {
        let s = entity.members.contains_key(&link.source);
        let t = entity.members.contains_key(&link.target);
        if s || t {
            touching += 1;
        }
        if s && t {
            internal += 1;
        }
    }
    if touching == 0 {
        0.0
    } else {
        internal as f64 / touching as f64
    }
}

pub fn observe(state: &GraphState, entity: &Entity) -> EntityObservation {
    let signals = &state.signals;
    let members = entity.members.len().max(1) as f64;

    let active = if signals.active_entities.contains(&entity.id) { 1.0 } else { 0.0 };
    let wm_presence = if entity.members.keys().any(|m| signals.wm_nodes.contains(m)) {
        1.0
    } else {
        0.0
    };
    let marked = entity
        .members
        .keys()
        .filter(|m| signals.marks.get(*m).is_some_and(|d| *d > 0.0))
        .count();
    let formed: Vec<f64> = entity
        .members
        .keys()
        .filter_map(|m| signals.formations.get(m).copied())
        .collect();
    let formation_quality =
        (!formed.is_empty()).then(|| formed.iter().sum::<f64>() / formed.len() as f64);

    EntityObservation {
        active,
        coherence: coherence(state, entity),
        wm_presence,
        reinforcement: marked as f64 / members,
        formation_quality,
    }
}

pub fn apply_observation(stats: &mut EntityStats, obs: &EntityObservation, alpha: f64) {
    stats.ema_active = ema(stats.ema_active, obs.active, alpha);
    stats.ema_coherence = ema(stats.ema_coherence, obs.coherence, alpha);
    stats.ema_wm_presence = ema(stats.ema_wm_presence, obs.wm_presence, alpha);
    stats.ema_reinforcement = ema(stats.ema_reinforcement, obs.reinforcement, alpha);
    if let Some(q) = obs.formation_quality {
        stats.ema_formation_quality = ema(stats.ema_formation_quality, q, alpha);
    }
}

/// Refresh EMAs for every live non-functional entity. Returns how many
/// were updated.
pub fn update_entity_emas(state: &mut GraphState, config: &LifecycleConfig) -> usize {
    let observations: Vec<(String, EntityObservation)> = state
        .entities()
        .filter(|e| !e.is_functional() && !e.is_dissolved())
        .map(|e| (e.id.clone(), observe(state, e)))
        .collect();
    let updated = observations.len();
    for (id, obs) in observations {
        if let Some(entity) = state.entity_mut(&id) {
            apply_observation(&mut entity.stats, &obs, config.ema_alpha);
        }
    }
    updated
}
