//! Mechanisms that misbehave on purpose.

use substrate_core::errors::MechanismError;
use substrate_core::traits::{Mechanism, MechanismStatus};
use substrate_core::{GraphState, SubstrateResult};

use crate::graphs::concept_node;

/// Scribbles on every node's energy, then fails. Nothing it wrote should survive.
pub struct FailingMechanism {
    name: String,
    runs: usize,
}

impl FailingMechanism {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: 0,
        }
    }

    pub fn runs(&self) -> usize {
        self.runs
    }
}

impl Mechanism for FailingMechanism {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        self.runs += 1;
        for node in state.nodes_mut() {
            node.energy += 1_000.0;
        }
        Err(MechanismError::Failed {
            mechanism: self.name.clone(),
            reason: "deliberate failure".to_string(),
        }
        .into())
    }
}

/// Adds `per_cycle` fresh concept nodes every cycle.
pub struct NodeSpawningMechanism {
    per_cycle: usize,
    spawned: usize,
}

impl NodeSpawningMechanism {
    pub fn new(per_cycle: usize) -> Self {
        Self {
            per_cycle,
            spawned: 0,
        }
    }
}

impl Mechanism for NodeSpawningMechanism {
    fn name(&self) -> &str {
        "node_spawner"
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        let now = state.now;
        for _ in 0..self.per_cycle {
            let id = format!("spawned-{:06}", self.spawned);
            self.spawned += 1;
            state.insert_node(concept_node(&id, 0.0, now))?;
        }
        Ok(MechanismStatus::Completed)
    }
}

/// Always defers.
pub struct DeferringMechanism;

impl Mechanism for DeferringMechanism {
    fn name(&self) -> &str {
        "deferring"
    }

    fn run(&mut self, _state: &mut GraphState) -> SubstrateResult<MechanismStatus> {
        Ok(MechanismStatus::Deferred {
            reason: "waiting on nothing".to_string(),
        })
    }
}
