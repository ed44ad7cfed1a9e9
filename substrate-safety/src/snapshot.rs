//! Point-in-time measurements of the whole graph.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use substrate_core::config::SafetyConfig;
use substrate_core::stats::{mad, median, normalized_entropy};
use substrate_core::GraphState;

/// What the monitor knows about the graph at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cycle: u64,
    pub at: DateTime<Utc>,
    pub node_count: usize,
    pub link_count: usize,
    pub entity_count: usize,
    pub total_energy: f64,
    pub entity_energies: BTreeMap<String, f64>,
    /// Nodes whose live degree exceeds `median + k·MAD`.
    pub hub_count: usize,
    /// Nodes with no live links.
    pub isolated_count: usize,
    /// Weakly connected components over live links.
    pub component_count: usize,
    pub active_nodes: BTreeSet<String>,
    /// Current nodes and links created inside the growth window.
    pub created_recently: usize,
    /// `None` when the graph holds no energy or fewer than two nodes.
    pub energy_entropy: Option<f64>,
}

impl SystemSnapshot {
    pub fn capture(state: &GraphState, config: &SafetyConfig) -> Self {
        let at = state.now;
        let window_start = at - Duration::seconds(config.growth_window_secs);

        let degrees: Vec<f64> = state.nodes().map(|n| state.degree(&n.id) as f64).collect();
        let isolated_count = degrees.iter().filter(|d| **d == 0.0).count();
        let hub_count = count_hubs(&degrees, config.hub_mad_k);

        let energies: Vec<f64> = state.nodes().map(|n| n.energy).collect();
        let created_recently = state
            .nodes()
            .filter(|n| n.temporal.created_at >= window_start)
            .count()
            + state
                .links()
                .filter(|l| l.temporal.created_at >= window_start)
                .count();

        Self {
            cycle: state.cycle,
            at,
            node_count: state.node_count(),
            link_count: state.link_count(),
            entity_count: state.entity_count(),
            total_energy: state.total_energy(),
            entity_energies: state
                .entities()
                .filter(|e| !e.is_dissolved())
                .map(|e| (e.id.clone(), e.energy))
                .collect(),
            hub_count,
            isolated_count,
            component_count: weak_components(state),
            active_nodes: state
                .nodes()
                .filter(|n| n.is_active())
                .map(|n| n.id.clone())
                .collect(),
            created_recently,
            energy_entropy: normalized_entropy(&energies),
        }
    }

    /// Nodes plus links, the quantity whose growth is fitted.
    pub fn size(&self) -> usize {
        self.node_count + self.link_count
    }
}

fn count_hubs(degrees: &[f64], k: f64) -> usize {
    let (Some(m), Some(d)) = (median(degrees), mad(degrees)) else {
        return 0;
    };
    let cutoff = m + k * d;
    degrees.iter().filter(|deg| **deg > cutoff).count()
}

fn weak_components(state: &GraphState) -> usize {
    let mut graph: UnGraph<(), ()> = UnGraph::with_capacity(state.node_count(), state.link_count());
    let index: BTreeMap<&str, NodeIndex> = state
        .nodes()
        .map(|n| (n.id.as_str(), graph.add_node(())))
        .collect();
    for link in state.live_links() {
        if let (Some(a), Some(b)) = (index.get(link.source.as_str()), index.get(link.target.as_str())) {
            graph.add_edge(*a, *b, ());
        }
    }
    connected_components(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_fixtures::{isolated_graph, ring_graph};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn ring_is_one_component_without_hubs() {
        let state = ring_graph(12, t0());
        let snap = SystemSnapshot::capture(&state, &SafetyConfig::default());
        assert_eq!(snap.component_count, 1);
        assert_eq!(snap.isolated_count, 0);
        assert_eq!(snap.hub_count, 0);
        assert_eq!(snap.created_recently, 24);
        assert_eq!(snap.size(), 24);
    }

    #[test]
    fn expired_links_leave_every_node_isolated() {
        let state = isolated_graph(50, t0());
        let snap = SystemSnapshot::capture(&state, &SafetyConfig::default());
        assert_eq!(snap.isolated_count, 50);
        assert_eq!(snap.component_count, 50);
    }

    #[test]
    fn star_centre_is_a_hub() {
        let mut state = ring_graph(12, t0());
        for i in 2..11 {
            let link = substrate_core::Link::new(
                "n0000",
                format!("n{i:04}"),
                substrate_core::LinkKind::relates_to(),
                0.5,
                t0(),
            );
            state.insert_link(link).unwrap();
        }
        let snap = SystemSnapshot::capture(&state, &SafetyConfig::default());
        assert_eq!(snap.hub_count, 1);
    }
}
