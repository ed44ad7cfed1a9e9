//! Type-dependent exponential energy decay and periodic weight decay.

use rayon::prelude::*;

use substrate_core::config::DecayConfig;
use substrate_core::{GraphState, Node};

/// `E ← E · exp(−base · multiplier(type) · Δt)` on every node.
/// Returns the total energy removed.
pub fn decay_energy(state: &mut GraphState, config: &DecayConfig, dt_seconds: f64) -> f64 {
    if dt_seconds <= 0.0 {
        return 0.0;
    }
    let mut nodes: Vec<&mut Node> = state.nodes_mut().collect();
    nodes
        .par_iter_mut()
        .map(|node| {
            let rate = config.base_energy_rate * config.multiplier(node.type_name());
            let before = node.energy;
            node.energy = before * (-rate * dt_seconds).exp();
            before - node.energy
        })
        .sum()
}

/// `log_weight ← log_weight − rate · multiplier(type) · Δt` on nodes; links
/// decay at the base rate.
/// Returns how many nodes are dormant afterwards.
pub fn decay_weights(state: &mut GraphState, config: &DecayConfig, elapsed_seconds: f64) -> usize {
    if elapsed_seconds <= 0.0 {
        return 0;
    }
    let mut nodes: Vec<&mut Node> = state.nodes_mut().collect();
    let dormant: usize = nodes
        .par_iter_mut()
        .map(|node| {
            let step = config.weight_rate * config.multiplier(node.type_name()) * elapsed_seconds;
            node.log_weight -= step;
            usize::from(node.is_dormant(config.dormant_weight))
        })
        .sum();
    for link in state.links_mut() {
        link.log_weight -= config.weight_rate * elapsed_seconds;
    }
    dormant
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::NodeContent;

    #[test]
    fn tasks_decay_faster_than_memories() {
        let now = now_millis();
        let mut state = GraphState::new(now);
        let task = NodeContent::Task {
            priority: "p".into(),
            estimated_hours: 1.0,
            steps: vec![],
        };
        let memory = NodeContent::Memory {
            occurred_at: now,
            participants: vec![],
        };
        state.insert_node(Node::new("t", "t", task, now).with_energy(1.0)).unwrap();
        state.insert_node(Node::new("m", "m", memory, now).with_energy(1.0)).unwrap();

        let removed = decay_energy(&mut state, &DecayConfig::default(), 3_600.0);
        let t = state.node("t").unwrap().energy;
        let m = state.node("m").unwrap().energy;
        assert!(t < m);
        assert!((t - (-0.000_02f64 * 5.0 * 3_600.0).exp()).abs() < 1e-12);
        assert!((removed - ((1.0 - t) + (1.0 - m))).abs() < 1e-12);
    }

    #[test]
    fn weight_decay_marks_dormancy() {
        let now = now_millis();
        let mut state = GraphState::new(now);
        let mut node = Node::new("c", "c", NodeContent::Concept { definition: String::new() }, now);
        node.log_weight = -6.9;
        state.insert_node(node).unwrap();
        let config = DecayConfig {
            weight_rate: 0.01,
            ..DecayConfig::default()
        };
        assert_eq!(decay_weights(&mut state, &config, 10.0), 1);
        assert!((state.node("c").unwrap().log_weight + 7.0).abs() < 1e-12);
    }
}
