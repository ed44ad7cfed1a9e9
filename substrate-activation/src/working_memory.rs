//! Working-memory selection.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use substrate_core::GraphState;

/// The `capacity` active nodes with the highest `energy · weight`, where
/// the weight includes the node's overlay for `context` when given.
/// Ties go to the smaller id.
pub fn select_working_memory(
    state: &GraphState,
    active: &BTreeSet<String>,
    capacity: usize,
    context: Option<&str>,
) -> Vec<String> {
    let mut scored: Vec<(&str, f64)> = active
        .iter()
        .filter_map(|id| {
            let node = state.node(id)?;
            Some((id.as_str(), node.energy * node.effective_log_weight(context).exp()))
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    scored
        .into_iter()
        .take(capacity)
        .map(|(id, _)| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::{Node, NodeContent};

    #[test]
    fn overlay_for_the_context_entity_reorders_selection() {
        let now = now_millis();
        let mut state = GraphState::new(now);
        let concept = NodeContent::Concept { definition: "d".into() };
        state.insert_node(Node::new("a", "a", concept.clone(), now).with_energy(1.0)).unwrap();
        let mut b = Node::new("b", "b", concept, now).with_energy(0.9);
        b.log_weight_overlays.insert("e".into(), 0.5);
        state.insert_node(b).unwrap();
        let active: BTreeSet<String> = ["a".to_string(), "b".to_string()].into();

        assert_eq!(select_working_memory(&state, &active, 1, None), ["a"]);
        assert_eq!(select_working_memory(&state, &active, 1, Some("other")), ["a"]);
        assert_eq!(select_working_memory(&state, &active, 1, Some("e")), ["b"]);
    }
}
