//! Cohort-relative node thresholds.

use std::collections::BTreeMap;

use substrate_core::config::ActivationConfig;
use substrate_core::stats::robust_threshold;
use substrate_core::{GraphState, Scope};

/// Set every node's threshold to `max(floor, median + k·MAD)` of the
/// energies in its (type, scope) cohort.
pub fn update_node_thresholds(state: &mut GraphState, config: &ActivationConfig) {
    let mut cohorts: BTreeMap<(String, Scope), Vec<f64>> = BTreeMap::new();
    for node in state.nodes() {
        cohorts
            .entry((node.type_name().to_string(), node.scope))
            .or_default()
            .push(node.energy);
    }
    let thresholds: BTreeMap<(String, Scope), f64> = cohorts
        .into_iter()
        .map(|(key, energies)| {
            let t = robust_threshold(&energies, config.threshold_mad_k, config.threshold_floor);
            (key, t)
        })
        .collect();

    for node in state.nodes_mut() {
        let key = (node.type_name().to_string(), node.scope);
        if let Some(t) = thresholds.get(&key) {
            node.threshold = *t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::{Node, NodeContent};

    fn node(id: &str, energy: f64, scope: Scope) -> Node {
        Node::new(id, id, NodeContent::Concept { definition: String::new() }, now_millis())
            .with_energy(energy)
            .with_scope(scope)
    }

    #[test]
    fn cohorts_are_split_by_scope() {
        let mut state = GraphState::new(now_millis());
        for (i, e) in [1.0, 1.0, 1.0, 9.0].iter().enumerate() {
            state.insert_node(node(&format!("p{i}"), *e, Scope::Personal)).unwrap();
        }
        state.insert_node(node("o", 0.0, Scope::Organizational)).unwrap();
        update_node_thresholds(&mut state, &ActivationConfig::default());

        // median 1.0, MAD 0.0 → threshold 1.0
        assert_eq!(state.node("p0").unwrap().threshold, 1.0);
        // lone zero-energy node falls back to the floor
        assert_eq!(state.node("o").unwrap().threshold, 0.1);
    }
}
