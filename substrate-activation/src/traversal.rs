//! Strides: each active node spends part of its surplus pushing energy
//! along outgoing links toward nodes that are short of their threshold.

use std::collections::{BTreeMap, BTreeSet};

use substrate_core::config::ActivationConfig;
use substrate_core::signals::TraversalTally;
use substrate_core::stats::rank_z_scores;
use substrate_core::{GraphState, Link};

use crate::valence::{choose_entity, ValenceContext};

/// How one sub-traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Budget spent.
    Depleted,
    /// No untried outgoing links left.
    Exhausted,
    /// Stride cap reached with budget left.
    Capped,
}

impl StopReason {
    pub fn completed(&self) -> bool {
        !matches!(self, StopReason::Capped)
    }
}

/// One energy transfer along a link.
#[derive(Debug, Clone, PartialEq)]
pub struct Stride {
    pub link_id: String,
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub gap_before: f64,
    /// Fraction of the target's gap this stride closed.
    pub gap_closure: f64,
}

/// Rank-z utility of each candidate link: log weight (with the overlay of
/// `entity`), gap-closure EMA, and reinforcement EMA. Raw values below the
/// cohort minimum.
fn link_utilities(links: &[&Link], entity: Option<&str>, min_cohort_size: usize) -> Vec<f64> {
    let columns: [Vec<f64>; 3] = [
        links.iter().map(|l| l.effective_log_weight(entity)).collect(),
        links.iter().map(|l| l.stats.ema_gap_closure).collect(),
        links.iter().map(|l| l.stats.ema_reinforcement).collect(),
    ];
    let mut utility = vec![0.0; links.len()];
    for column in columns {
        let normalised = if column.len() < min_cohort_size {
            column
        } else {
            rank_z_scores(&column)
        };
        for (u, v) in utility.iter_mut().zip(normalised) {
            *u += v;
        }
    }
    utility
}

/// Pick the next link for `source`, or `None` when no candidates remain.
fn next_link(
    state: &GraphState,
    source: &str,
    used: &BTreeSet<String>,
    ctx: &ValenceContext<'_>,
    config: &ActivationConfig,
) -> Option<(String, usize)> {
    let candidates: Vec<&Link> = state
        .outgoing_links(source)
        .filter(|l| l.target != source && !used.contains(&l.id))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let chosen = choose_entity(state, &candidates, ctx, config.min_cohort_size);
    let restricted: Vec<&Link> = match chosen {
        Some(entity) => candidates
            .iter()
            .copied()
            .filter(|l| entity.members.contains_key(&l.target))
            .collect(),
        None => candidates.clone(),
    };

    let entity_id = chosen.map(|e| e.id.as_str());
    let utility = link_utilities(&restricted, entity_id, config.min_cohort_size);
    let mut best = 0;
    for i in 1..restricted.len() {
        let better = utility[i] > utility[best]
            || (utility[i] == utility[best] && restricted[i].id < restricted[best].id);
        if better {
            best = i;
        }
    }
    restricted
        .get(best)
        .map(|l| (l.id.clone(), candidates.len()))
}

/// Run the sub-traversal for one source. Strides are applied to `state`
/// immediately so later sources see the moved energy.
pub fn traverse_from(
    state: &mut GraphState,
    source: &str,
    ctx: &ValenceContext<'_>,
    config: &ActivationConfig,
) -> (Vec<Stride>, StopReason) {
    let budget = match state.node(source) {
        Some(n) => config.spread_fraction * n.surplus(),
        None => return (Vec::new(), StopReason::Exhausted),
    };
    let mut remaining = budget;
    let mut used = BTreeSet::new();
    let mut strides = Vec::new();

    let reason = loop {
        if remaining <= config.min_stride_energy {
            break StopReason::Depleted;
        }
        if strides.len() >= config.max_strides_per_node {
            break StopReason::Capped;
        }
        let Some((link_id, open)) = next_link(state, source, &used, ctx, config) else {
            break StopReason::Exhausted;
        };
        used.insert(link_id.clone());

        let Some(target) = state.link(&link_id).map(|l| l.target.clone()) else {
            break StopReason::Exhausted;
        };
        let gap_before = state.node(&target).map_or(0.0, |n| n.gap());
        let amount = if gap_before > 0.0 {
            remaining.min(gap_before)
        } else {
            remaining / open as f64
        };

        let taken = match state.node_mut(source) {
            Some(n) => -n.add_energy(-amount),
            None => 0.0,
        };
        if let Some(t) = state.node_mut(&target) {
            t.add_energy(taken);
        }
        remaining -= taken;

        let gap_closure = if gap_before > 0.0 {
            taken.min(gap_before) / gap_before
        } else {
            0.0
        };
        strides.push(Stride {
            link_id,
            source: source.to_string(),
            target,
            amount: taken,
            gap_before,
            gap_closure,
        });
    };
    (strides, reason)
}

/// Run a sub-traversal from every source, in id order, and record flow and
/// gap closure on the links and in the cycle signals.
pub fn run_strides(
    state: &mut GraphState,
    sources: &BTreeSet<String>,
    config: &ActivationConfig,
) -> TraversalTally {
    let mut tally = TraversalTally::default();
    let active_centroid = crate::valence::mean_embedding(state, sources);
    let goal = state.goal.clone();
    let mut flows: BTreeMap<String, f64> = BTreeMap::new();
    let mut closures: BTreeMap<String, f64> = BTreeMap::new();

    for source in sources {
        let ctx = ValenceContext {
            goal: goal.as_deref(),
            active: sources,
            active_centroid: active_centroid.clone(),
        };
        let (strides, reason) = traverse_from(state, source, &ctx, config);
        tally.started += 1;
        tally.strides += strides.len();
        if reason.completed() {
            tally.completed += 1;
        } else {
            tally.capped += 1;
        }
        for s in strides {
            *flows.entry(s.link_id.clone()).or_insert(0.0) += s.amount;
            let best = closures.entry(s.link_id).or_insert(0.0);
            *best = best.max(s.gap_closure);
        }
    }

    let now = state.now;
    for (link_id, amount) in &flows {
        if let Some(link) = state.link_mut(link_id) {
            link.record_flow(*amount);
            link.last_update_timestamp = Some(now);
        }
    }
    for (id, amount) in flows {
        *state.signals.flows.entry(id).or_insert(0.0) += amount;
    }
    for (id, phi) in closures {
        let best = state.signals.gap_closures.entry(id).or_insert(0.0);
        *best = best.max(phi);
    }
    tally
}

/// Credit causal precedence on every live link touching a node that became
/// active this cycle. Returns the number of credits given.
pub fn credit_precedence(
    state: &mut GraphState,
    before: &BTreeSet<String>,
    after: &BTreeSet<String>,
) -> usize {
    let flipped: BTreeSet<&String> = after.difference(before).collect();
    let mut forward = Vec::new();
    let mut backward = Vec::new();
    for link in state.live_links() {
        if flipped.contains(&link.target) && before.contains(&link.source) {
            forward.push(link.id.clone());
        }
        if flipped.contains(&link.source) && before.contains(&link.target) {
            backward.push(link.id.clone());
        }
    }
    for id in &forward {
        if let Some(link) = state.link_mut(id) {
            link.precedence_forward += 1.0;
        }
    }
    for id in &backward {
        if let Some(link) = state.link_mut(id) {
            link.precedence_backward += 1.0;
        }
    }
    forward.len() + backward.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::{Node, NodeContent};

    fn node(id: &str, energy: f64, threshold: f64) -> Node {
        let mut n = Node::new(id, id, NodeContent::Concept { definition: String::new() }, now_millis())
            .with_energy(energy);
        n.threshold = threshold;
        n
    }

    fn star(targets: &[(&str, f64)]) -> GraphState {
        let now = now_millis();
        let mut state = GraphState::new(now);
        state.insert_node(node("s", 10.0, 1.0)).unwrap();
        for (id, energy) in targets {
            state.insert_node(node(id, *energy, 1.0)).unwrap();
            state
                .insert_link(Link::new("s", *id, substrate_core::LinkKind::relates_to(), 0.5, now))
                .unwrap();
        }
        state
    }

    #[test]
    fn strides_fill_gaps_then_stop_on_depletion() {
        let mut state = star(&[("a", 0.5), ("b", 0.0)]);
        let active: BTreeSet<String> = ["s".to_string()].into();
        let ctx = ValenceContext {
            goal: None,
            active: &active,
            active_centroid: None,
        };
        let config = ActivationConfig::default();
        let (strides, reason) = traverse_from(&mut state, "s", &ctx, &config);

        // budget 0.5 · 9 = 4.5; gaps 0.5 and 1.0 are closed, then the rest is exhausted
        assert_eq!(reason, StopReason::Exhausted);
        assert_eq!(strides.len(), 2);
        assert!(strides.iter().all(|s| (s.gap_closure - 1.0).abs() < 1e-12));
        let total: f64 = state.nodes().map(|n| n.energy).sum();
        assert!((total - 10.5).abs() < 1e-9);
    }

    #[test]
    fn chosen_entity_overlay_steers_the_first_stride() {
        let mut state = star(&[("a", 0.0), ("b", 0.0)]);
        let now = state.now;
        let entity = substrate_core::Entity::new("e", "e", substrate_core::EntityKind::Emergent, now)
            .with_member("a", 1.0)
            .with_member("b", 1.0);
        state.insert_entity(entity).unwrap();
        let active: BTreeSet<String> = ["s".to_string()].into();
        let ctx = ValenceContext {
            goal: None,
            active: &active,
            active_centroid: None,
        };
        let config = ActivationConfig::default();

        let (plain, _) = traverse_from(&mut state.clone(), "s", &ctx, &config);
        assert_eq!(plain[0].target, "a");

        let to_b = Link::logical_id("s", "b", substrate_core::LinkKind::relates_to().type_name());
        state.link_mut(&to_b).unwrap().log_weight_overlays.insert("e".into(), 0.5);
        let (steered, _) = traverse_from(&mut state, "s", &ctx, &config);
        assert_eq!(steered[0].target, "b");
    }

    #[test]
    fn stride_cap_counts_as_incomplete() {
        let targets: Vec<(String, f64)> = (0..12).map(|i| (format!("t{i:02}"), 0.99)).collect();
        let refs: Vec<(&str, f64)> = targets.iter().map(|(s, e)| (s.as_str(), *e)).collect();
        let mut state = star(&refs);
        let sources: BTreeSet<String> = ["s".to_string()].into();
        let tally = run_strides(&mut state, &sources, &ActivationConfig::default());
        assert_eq!(tally.started, 1);
        assert_eq!(tally.capped, 1);
        assert_eq!(tally.strides, 8);
    }

    #[test]
    fn precedence_is_credited_forward() {
        let mut state = star(&[("a", 0.0)]);
        let before: BTreeSet<String> = ["s".to_string()].into();
        let after: BTreeSet<String> = ["s".to_string(), "a".to_string()].into();
        assert_eq!(credit_precedence(&mut state, &before, &after), 1);
        let link = state.links().next().unwrap();
        assert_eq!(link.precedence_forward, 1.0);
        assert_eq!(link.precedence_backward, 0.0);
    }
}
