//! Stimulus injection: energy added from outside the graph.

use std::cmp::Ordering;

use substrate_core::config::ActivationConfig;
use substrate_core::stats::cosine_similarity;
use substrate_core::{GraphState, SubstrateError, SubstrateResult};

use crate::active_set::neighborhood;

/// Add `amount` to a node and spill `amount · spill_decay^hops` onto its
/// neighbourhood out to `spill_hops`. Returns the energy actually applied.
pub fn inject_node(
    state: &mut GraphState,
    node_id: &str,
    amount: f64,
    config: &ActivationConfig,
) -> SubstrateResult<f64> {
    if !state.contains_node(node_id) {
        return Err(SubstrateError::NotFound {
            id: node_id.to_string(),
        });
    }
    let amount = amount.max(0.0);
    let hops = neighborhood(state, &[node_id], config.spill_hops);
    let mut applied = 0.0;
    for (id, distance) in hops {
        let share = amount * config.spill_decay.powi(distance as i32);
        if let Some(node) = state.node_mut(&id) {
            applied += node.add_energy(share);
        }
    }
    Ok(applied)
}

/// Split `amount` between a link's endpoints by its smoothed precedence.
pub fn inject_link(state: &mut GraphState, link_id: &str, amount: f64) -> SubstrateResult<f64> {
    let (source, target, share) = match state.link(link_id) {
        Some(l) => (l.source.clone(), l.target.clone(), l.source_share()),
        None => {
            return Err(SubstrateError::NotFound {
                id: link_id.to_string(),
            })
        }
    };
    let amount = amount.max(0.0);
    let mut applied = 0.0;
    if let Some(n) = state.node_mut(&source) {
        applied += n.add_energy(amount * share);
    }
    if let Some(n) = state.node_mut(&target) {
        applied += n.add_energy(amount * (1.0 - share));
    }
    Ok(applied)
}

/// Give each of the `embedding_top_k` most similar nodes `amount · max(0, cos)`.
pub fn inject_embedding(
    state: &mut GraphState,
    embedding: &[f32],
    amount: f64,
    config: &ActivationConfig,
) -> f64 {
    let mut scored: Vec<(String, f64)> = state
        .nodes()
        .filter_map(|n| {
            let e = n.embedding.as_deref()?;
            (e.len() == embedding.len()).then(|| (n.id.clone(), cosine_similarity(e, embedding)))
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let amount = amount.max(0.0);
    let mut applied = 0.0;
    for (id, similarity) in scored.into_iter().take(config.embedding_top_k) {
        if let Some(node) = state.node_mut(&id) {
            applied += node.add_energy(amount * similarity.max(0.0));
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::{Link, LinkKind, Node, NodeContent};

    fn state_with_pair() -> GraphState {
        let now = now_millis();
        let mut state = GraphState::new(now);
        for id in ["a", "b", "c"] {
            let n = Node::new(id, id, NodeContent::Concept { definition: String::new() }, now);
            state.insert_node(n).unwrap();
        }
        state.insert_link(Link::new("a", "b", LinkKind::relates_to(), 0.5, now)).unwrap();
        state
    }

    #[test]
    fn node_injection_spills_to_neighbours() {
        let mut state = state_with_pair();
        let applied = inject_node(&mut state, "a", 1.0, &ActivationConfig::default()).unwrap();
        assert_eq!(state.node("a").unwrap().energy, 1.0);
        assert_eq!(state.node("b").unwrap().energy, 0.25);
        assert_eq!(state.node("c").unwrap().energy, 0.0);
        assert!((applied - 1.25).abs() < 1e-12);
    }

    #[test]
    fn unobserved_link_splits_evenly() {
        let mut state = state_with_pair();
        let id = Link::logical_id("a", "b", "relates_to");
        let applied = inject_link(&mut state, &id, 2.0).unwrap();
        assert_eq!(state.node("a").unwrap().energy, 1.0);
        assert_eq!(state.node("b").unwrap().energy, 1.0);
        assert_eq!(applied, 2.0);
    }

    #[test]
    fn forward_precedence_favours_the_source() {
        let mut state = state_with_pair();
        let id = Link::logical_id("a", "b", "relates_to");
        state.link_mut(&id).unwrap().precedence_forward = 2.0;
        inject_link(&mut state, &id, 1.0).unwrap();
        assert!((state.node("a").unwrap().energy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn missing_target_is_not_found() {
        let mut state = state_with_pair();
        let err = inject_node(&mut state, "zz", 1.0, &ActivationConfig::default()).unwrap_err();
        assert!(matches!(err, SubstrateError::NotFound { .. }));
    }

    #[test]
    fn embedding_injection_skips_dissimilar_nodes() {
        let now = now_millis();
        let mut state = GraphState::new(now);
        let concept = || NodeContent::Concept { definition: String::new() };
        state.insert_node(Node::new("x", "x", concept(), now).with_embedding(vec![1.0, 0.0])).unwrap();
        state.insert_node(Node::new("y", "y", concept(), now).with_embedding(vec![-1.0, 0.0])).unwrap();
        let applied = inject_embedding(&mut state, &[1.0, 0.0], 1.0, &ActivationConfig::default());
        assert!((applied - 1.0).abs() < 1e-6);
        assert_eq!(state.node("y").unwrap().energy, 0.0);
    }
}
