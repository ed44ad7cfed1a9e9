//! The activation-side stages of a cycle, each wrapped as a [`Mechanism`].

use chrono::{DateTime, Utc};
use tracing::debug;

use substrate_core::config::{ActivationConfig, DecayConfig};
use substrate_core::traits::{Mechanism, MechanismStatus};
use substrate_core::{GraphState, SubstrateResult};

use crate::active_set::{active_nodes, frontier};
use crate::decay::{decay_energy, decay_weights};
use crate::entity_energy::aggregate_entities;
use crate::threshold::update_node_thresholds;
use crate::traversal::{credit_precedence, run_strides};
use crate::working_memory::select_working_memory;

/// Thresholds, strides, precedence credit, frontier, and working memory.
pub struct ActivationMechanism {
    config: ActivationConfig,
}

impl ActivationMechanism {
    pub fn new(config: ActivationConfig) -> Self {
        Self { config }
    }
}

impl Mechanism for ActivationMechanism {
    fn name(&self) -> &str {
        "activation"
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        update_node_thresholds(state, &self.config);
        let before = active_nodes(state);

        let tally = run_strides(state, &before, &self.config);
        let after = active_nodes(state);
        let credits = credit_precedence(state, &before, &after);
        let frontier = frontier(state, &after);
        let context = state.dominant_entity().map(str::to_string);
        let wm = select_working_memory(state, &after, self.config.wm_capacity, context.as_deref());

        debug!(
            cycle = state.cycle,
            active_before = before.len(),
            active_after = after.len(),
            strides = tally.strides,
            capped = tally.capped,
            credits,
            frontier = frontier.len(),
            "activation spread"
        );

        let signals = &mut state.signals;
        signals.active_before = before;
        signals.active_nodes = after;
        signals.frontier = frontier;
        signals.wm_nodes = wm.into_iter().collect();
        signals.traversals.started += tally.started;
        signals.traversals.completed += tally.completed;
        signals.traversals.capped += tally.capped;
        signals.traversals.strides += tally.strides;
        Ok(MechanismStatus::Completed)
    }
}

/// Energy decay every cycle, weight decay every N cycles.
pub struct DecayMechanism {
    config: DecayConfig,
    last_weight_decay: Option<DateTime<Utc>>,
}

impl DecayMechanism {
    pub fn new(config: DecayConfig) -> Self {
        Self {
            config,
            last_weight_decay: None,
        }
    }

    fn weight_decay_due(&self, cycle: u64) -> bool {
        let every = self.config.weight_decay_every_n_cycles;
        every > 0 && cycle > 0 && cycle % every == 0
    }
}

impl Mechanism for DecayMechanism {
    fn name(&self) -> &str {
        "decay"
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        let dt = state.signals.dt_seconds;
        let removed = decay_energy(state, &self.config, dt);
        state.signals.decayed_energy += removed;

        if self.weight_decay_due(state.cycle) {
            let elapsed = match self.last_weight_decay {
                Some(at) => (state.now - at).num_milliseconds() as f64 / 1_000.0,
                None => dt,
            };
            let dormant = decay_weights(state, &self.config, elapsed);
            self.last_weight_decay = Some(state.now);
            debug!(cycle = state.cycle, elapsed, dormant, "weight decay");
        }
        debug!(cycle = state.cycle, dt, removed, "energy decay");
        Ok(MechanismStatus::Completed)
    }
}

/// Entity energies, thresholds, flips, and centroids.
pub struct EntityAggregationMechanism {
    config: ActivationConfig,
}

impl EntityAggregationMechanism {
    pub fn new(config: ActivationConfig) -> Self {
        Self { config }
    }
}

impl Mechanism for EntityAggregationMechanism {
    fn name(&self) -> &str {
        "entity_aggregation"
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        let flips = aggregate_entities(state, &self.config);
        debug!(
            cycle = state.cycle,
            flips = flips.len(),
            active = state.signals.active_entities.len(),
            "entity aggregation"
        );
        state.signals.entity_flips.extend(flips);
        Ok(MechanismStatus::Completed)
    }
}
