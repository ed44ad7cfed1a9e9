use tracing::{debug, info};

use substrate_core::config::LifecycleConfig;
use substrate_core::traits::{Mechanism, MechanismStatus};
use substrate_core::{GraphState, SubstrateResult};

use crate::emas::update_entity_emas;
use crate::transitions::evaluate_transitions;

pub struct LifecycleMechanism {
    config: LifecycleConfig,
}

impl LifecycleMechanism {
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config }
    }
}

impl Mechanism for LifecycleMechanism {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        let refreshed = update_entity_emas(state, &self.config);
        let transitions = evaluate_transitions(state, &self.config)?;
        for t in &transitions {
            info!(
                entity = %t.entity_id,
                from = %t.from,
                to = %t.to,
                quality = t.quality,
                age = t.age,
                "entity lifecycle transition"
            );
        }
        debug!(cycle = state.cycle, refreshed, transitions = transitions.len(), "lifecycle");
        Ok(MechanismStatus::Completed)
    }
}
