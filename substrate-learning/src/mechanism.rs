use rayon::prelude::*;
use tracing::debug;

use substrate_core::config::LearningConfig;
use substrate_core::stats::ema;
use substrate_core::traits::{Mechanism, MechanismStatus};
use substrate_core::{GraphState, Node, SubstrateResult};

use crate::weights::{update_link_weights, update_node_weights};

/// Per-cycle weight learning over everything the cycle's signals touched.
pub struct LearningMechanism {
    config: LearningConfig,
}

impl LearningMechanism {
    pub fn new(config: LearningConfig) -> Self {
        Self { config }
    }
}

impl Mechanism for LearningMechanism {
    fn name(&self) -> &str {
        "learning"
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        let alpha = self.config.ema_alpha;
        let active = state.signals.active_nodes.clone();
        let mut nodes: Vec<&mut Node> = state.nodes_mut().collect();
        nodes.par_iter_mut().for_each(|node| {
            let x = if active.contains(&node.id) { 1.0 } else { 0.0 };
            node.stats.ema_activation = ema(node.stats.ema_activation, x, alpha);
        });

        let node_updates = update_node_weights(state, &self.config);
        let link_updates = update_link_weights(state, &self.config);
        let moved: f64 = node_updates
            .iter()
            .chain(&link_updates)
            .map(|u| u.delta_log_weight.abs())
            .sum();
        debug!(
            cycle = state.cycle,
            nodes = node_updates.len(),
            links = link_updates.len(),
            total_abs_delta = moved,
            "weights updated"
        );
        Ok(MechanismStatus::Completed)
    }
}
