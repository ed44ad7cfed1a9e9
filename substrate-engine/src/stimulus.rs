//! Ingress: what the outside world can push into a cycle.

use substrate_activation::stimulus::{inject_embedding, inject_link, inject_node};
use substrate_core::config::ActivationConfig;
use substrate_core::{GraphState, SubstrateResult};
use substrate_learning::{apply_formations, parse_trace, UsageMark};

#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    /// Trace text: usage marks and formation blocks.
    Text(String),
    /// Usage marks already parsed by the producer.
    Marks(Vec<UsageMark>),
    /// Energy onto a node, spilling onto its neighbourhood.
    Node { id: String, amount: f64 },
    /// Energy onto a link's endpoints, split by precedence.
    Link { id: String, amount: f64 },
    /// Energy onto the nodes closest to an embedding.
    Embedding { vector: Vec<f32>, amount: f64 },
    /// Replace the current goal direction. `None` clears it.
    Goal(Option<Vec<f32>>),
}

impl Stimulus {
    pub fn kind(&self) -> &'static str {
        match self {
            Stimulus::Text(_) => "text",
            Stimulus::Marks(_) => "marks",
            Stimulus::Node { .. } => "node",
            Stimulus::Link { .. } => "link",
            Stimulus::Embedding { .. } => "embedding",
            Stimulus::Goal(_) => "goal",
        }
    }
}

/// Apply one stimulus to the working state. Returns the energy it added.
///
/// Formation blocks in text are written through the same versioning rules
/// as any other change, so a trace can supersede existing nodes.
pub fn apply_stimulus(
    state: &mut GraphState,
    stimulus: &Stimulus,
    config: &ActivationConfig,
    agent: &str,
) -> SubstrateResult<f64> {
    match stimulus {
        Stimulus::Text(text) => {
            let parsed = parse_trace(text)?;
            parsed.record_marks(&mut state.signals);
            apply_formations(state, &parsed, agent)?;
            Ok(0.0)
        }
        Stimulus::Marks(marks) => {
            for mark in marks {
                state.signals.add_mark(mark.record_id.clone(), mark.level.delta());
            }
            Ok(0.0)
        }
        Stimulus::Node { id, amount } => inject_node(state, id, *amount, config),
        Stimulus::Link { id, amount } => inject_link(state, id, *amount),
        Stimulus::Embedding { vector, amount } => {
            Ok(inject_embedding(state, vector, *amount, config))
        }
        Stimulus::Goal(goal) => {
            state.goal = goal.clone();
            Ok(0.0)
        }
    }
}
