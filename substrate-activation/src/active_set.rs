//! Active set, frontier, and hop-distance neighbourhoods.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use substrate_core::constants::MAX_NEIGHBORHOOD_HOPS;
use substrate_core::GraphState;

/// Current nodes with positive energy at or above their threshold.
pub fn active_nodes(state: &GraphState) -> BTreeSet<String> {
    state
        .nodes()
        .filter(|n| n.is_active())
        .map(|n| n.id.clone())
        .collect()
}

/// One-hop outgoing neighbours of `active` over live links, minus `active`.
pub fn frontier(state: &GraphState, active: &BTreeSet<String>) -> BTreeSet<String> {
    active
        .iter()
        .flat_map(|id| state.outgoing_links(id))
        .map(|l| l.target.clone())
        .filter(|t| !active.contains(t))
        .collect()
}

/// Breadth-first hop distances from `seeds`, following live links in either
/// direction, up to `max_hops` (capped at [`MAX_NEIGHBORHOOD_HOPS`]).
/// Seeds are at distance 0.
pub fn neighborhood(
    state: &GraphState,
    seeds: &[&str],
    max_hops: usize,
) -> BTreeMap<String, usize> {
    let max_hops = max_hops.min(MAX_NEIGHBORHOOD_HOPS);
    let mut dist: BTreeMap<String, usize> = BTreeMap::new();
    let mut queue = VecDeque::new();
    for seed in seeds {
        if state.contains_node(seed) && !dist.contains_key(*seed) {
            dist.insert(seed.to_string(), 0);
            queue.push_back(seed.to_string());
        }
    }

    while let Some(id) = queue.pop_front() {
        let d = dist.get(&id).copied().unwrap_or(0);
        if d >= max_hops {
            continue;
        }
        let neighbours: BTreeSet<String> = state
            .outgoing_links(&id)
            .map(|l| l.target.clone())
            .chain(state.incoming_links(&id).map(|l| l.source.clone()))
            .collect();
        for next in neighbours {
            if !dist.contains_key(&next) {
                dist.insert(next.clone(), d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::{Link, LinkKind, Node, NodeContent};

    fn chain(n: usize) -> GraphState {
        let now = now_millis();
        let mut state = GraphState::new(now);
        for i in 0..n {
            let node = Node::new(
                format!("n{i}"),
                "n",
                NodeContent::Concept { definition: String::new() },
                now,
            );
            state.insert_node(node).unwrap();
        }
        for i in 1..n {
            let link = Link::new(format!("n{}", i - 1), format!("n{i}"), LinkKind::relates_to(), 0.5, now);
            state.insert_link(link).unwrap();
        }
        state
    }

    #[test]
    fn bfs_reports_hop_distances_both_ways() {
        let state = chain(5);
        let hops = neighborhood(&state, &["n2"], 1);
        assert_eq!(hops.len(), 3);
        assert_eq!(hops["n1"], 1);
        assert_eq!(hops["n3"], 1);

        let far = neighborhood(&state, &["n0"], 10);
        assert_eq!(far["n4"], 4);
    }

    #[test]
    fn frontier_excludes_active_nodes() {
        let state = chain(4);
        let active: BTreeSet<String> = ["n0", "n1"].iter().map(|s| s.to_string()).collect();
        let f = frontier(&state, &active);
        assert_eq!(f.into_iter().collect::<Vec<_>>(), vec!["n2".to_string()]);
    }
}
