//! Signal EMAs and `log_weight` updates for touched nodes and links.
//!
//! Every update in a cycle is computed against the same pre-update view
//! (cohort columns hold previous EMAs), then applied in one pass.
//!
//! Only `global_share` of an update lands on `log_weight`. When a record is
//! marked in a cycle where entities containing it are active, the
//! `overlay_share` goes to those entities' overlays, scaled by membership
//! and clamped to `overlay_cap`. Readers add the overlay of the entity in
//! context to the global weight.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use substrate_core::config::LearningConfig;
use substrate_core::graph::{LinkStats, NodeStats};
use substrate_core::signals::CycleSignals;
use substrate_core::stats::{adaptive_eta, ema};
use substrate_core::{GraphState, Scope};

use crate::cohort::cohort_z;

/// A usage signal that feeds a record's EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Signal {
    Reinforcement,
    WmPresence,
    FormationQuality,
    GapClosure,
    Flow,
}

impl Signal {
    /// Whether an observation counts toward the weight update. Being outside
    /// working memory still decays the presence EMA but is not evidence
    /// against the record.
    fn is_evidence(self, value: f64) -> bool {
        !matches!(self, Signal::WmPresence) || value > 0.0
    }
}

/// The result of learning for one record this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightUpdate {
    pub id: String,
    pub eta: f64,
    pub z_sum: f64,
    /// Change applied to the global `log_weight`.
    pub delta_log_weight: f64,
    /// New EMA per observed signal.
    pub emas: Vec<(Signal, f64)>,
    /// New overlay value per entity touched by this update.
    pub overlays: Vec<(String, f64)>,
}

fn node_ema(stats: &NodeStats, signal: Signal) -> f64 {
    match signal {
        Signal::Reinforcement => stats.ema_reinforcement,
        Signal::WmPresence => stats.ema_wm_presence,
        Signal::FormationQuality => stats.ema_formation_quality,
        Signal::GapClosure | Signal::Flow => 0.0,
    }
}

fn set_node_ema(stats: &mut NodeStats, signal: Signal, value: f64) {
    match signal {
        Signal::Reinforcement => stats.ema_reinforcement = value,
        Signal::WmPresence => stats.ema_wm_presence = value,
        Signal::FormationQuality => stats.ema_formation_quality = value,
        Signal::GapClosure | Signal::Flow => {}
    }
}

fn link_ema(stats: &LinkStats, signal: Signal) -> f64 {
    match signal {
        Signal::Reinforcement => stats.ema_reinforcement,
        Signal::FormationQuality => stats.ema_formation_quality,
        Signal::GapClosure => stats.ema_gap_closure,
        Signal::Flow => stats.ema_flow,
        Signal::WmPresence => 0.0,
    }
}

fn set_link_ema(stats: &mut LinkStats, signal: Signal, value: f64) {
    match signal {
        Signal::Reinforcement => stats.ema_reinforcement = value,
        Signal::FormationQuality => stats.ema_formation_quality = value,
        Signal::GapClosure => stats.ema_gap_closure = value,
        Signal::Flow => stats.ema_flow = value,
        Signal::WmPresence => {}
    }
}

fn node_observations(signals: &CycleSignals, id: &str) -> Vec<(Signal, f64)> {
    let mut observed = Vec::with_capacity(3);
    if let Some(mark) = signals.marks.get(id) {
        observed.push((Signal::Reinforcement, *mark));
    }
    let in_wm = if signals.wm_nodes.contains(id) { 1.0 } else { 0.0 };
    observed.push((Signal::WmPresence, in_wm));
    if let Some(q) = signals.formations.get(id) {
        observed.push((Signal::FormationQuality, *q));
    }
    observed
}

fn link_observations(signals: &CycleSignals, id: &str) -> Vec<(Signal, f64)> {
    let mut observed = Vec::with_capacity(4);
    if let Some(mark) = signals.marks.get(id) {
        observed.push((Signal::Reinforcement, *mark));
    }
    if let Some(q) = signals.formations.get(id) {
        observed.push((Signal::FormationQuality, *q));
    }
    if let Some(phi) = signals.gap_closures.get(id) {
        observed.push((Signal::GapClosure, *phi));
    }
    if let Some(flow) = signals.flows.get(id) {
        observed.push((Signal::Flow, *flow));
    }
    observed
}

/// What the update needs to know about a record, independent of its kind.
struct Member<'a, S> {
    id: &'a str,
    stats: &'a S,
    overlays: &'a BTreeMap<String, f64>,
    update_interval: f64,
    update_count: u64,
}

#[allow(clippy::too_many_arguments)]
fn compute_update<S>(
    member: &Member<'_, S>,
    cohort: &[Member<'_, S>],
    position: usize,
    observed: Vec<(Signal, f64)>,
    memberships: Vec<(String, f64)>,
    read: fn(&S, Signal) -> f64,
    dt_seconds: f64,
    config: &LearningConfig,
) -> WeightUpdate {
    let mut z_sum = 0.0;
    let mut emas = Vec::with_capacity(observed.len());
    for (signal, x) in observed {
        let new_ema = ema(read(member.stats, signal), x, config.ema_alpha);
        if signal.is_evidence(x) {
            let previous: Vec<f64> = cohort.iter().map(|m| read(m.stats, signal)).collect();
            z_sum += cohort_z(&previous, position, new_ema, config.min_cohort_size);
        }
        emas.push((signal, new_ema));
    }
    let tau = (member.update_count > 0).then_some(member.update_interval);
    let eta = adaptive_eta(
        dt_seconds,
        tau,
        config.first_update_eta,
        config.eta_min,
        config.eta_max,
    );
    let overlays = memberships
        .into_iter()
        .map(|(entity, membership)| {
            let old = member.overlays.get(&entity).copied().unwrap_or(0.0);
            let delta = config.overlay_share * eta * z_sum * membership;
            let new = (old + delta).clamp(-config.overlay_cap, config.overlay_cap);
            (entity, new)
        })
        .collect();
    WeightUpdate {
        id: member.id.to_string(),
        eta,
        z_sum,
        delta_log_weight: config.global_share * eta * z_sum,
        emas,
        overlays,
    }
}

/// Active entities containing `node_id`, with its membership weight. Empty
/// unless the node was marked this cycle.
fn node_memberships(state: &GraphState, node_id: &str) -> Vec<(String, f64)> {
    if !state.signals.marks.get(node_id).is_some_and(|m| *m != 0.0) {
        return Vec::new();
    }
    state
        .entities_containing(node_id)
        .filter(|e| state.signals.active_entities.contains(&e.id))
        .filter_map(|e| {
            let m = e.members.get(node_id).copied().unwrap_or(0.0);
            (m > 0.0).then(|| (e.id.clone(), m))
        })
        .collect()
}

/// Active entities containing both endpoints of a marked link, with the
/// smaller of the two memberships.
fn link_memberships(state: &GraphState, link_id: &str) -> Vec<(String, f64)> {
    if !state.signals.marks.get(link_id).is_some_and(|m| *m != 0.0) {
        return Vec::new();
    }
    let Some(link) = state.link(link_id) else {
        return Vec::new();
    };
    state
        .entities_containing(&link.source)
        .filter(|e| state.signals.active_entities.contains(&e.id))
        .filter_map(|e| {
            let source = e.members.get(&link.source).copied().unwrap_or(0.0);
            let target = e.members.get(&link.target).copied()?;
            let m = source.min(target);
            (m > 0.0).then(|| (e.id.clone(), m))
        })
        .collect()
}

/// Seconds between the last update and `now`, or `None` for a first update.
fn interval_since(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
    last.map(|t| ((now - t).num_milliseconds() as f64 / 1_000.0).max(0.0))
}

fn next_interval_ema(old: f64, count: u64, observed: Option<f64>, alpha: f64) -> f64 {
    match (count, observed) {
        (_, None) => old,
        (0 | 1, Some(interval)) => interval,
        (_, Some(interval)) => ema(old, interval, alpha),
    }
}

/// Update every node touched this cycle. Returns the applied updates.
pub fn update_node_weights(state: &mut GraphState, config: &LearningConfig) -> Vec<WeightUpdate> {
    let touched = state.signals.touched();
    let updates: Vec<WeightUpdate> = {
        let mut cohorts: BTreeMap<(String, Scope), Vec<Member<'_, NodeStats>>> = BTreeMap::new();
        for node in state.nodes() {
            cohorts
                .entry((node.type_name().to_string(), node.scope))
                .or_default()
                .push(Member {
                    id: &node.id,
                    stats: &node.stats,
                    overlays: &node.log_weight_overlays,
                    update_interval: node.stats.ema_update_interval,
                    update_count: node.stats.update_count,
                });
        }
        let positions: BTreeMap<&str, (&(String, Scope), usize)> = cohorts
            .iter()
            .flat_map(|(key, members)| {
                members.iter().enumerate().map(move |(i, m)| (m.id, (key, i)))
            })
            .collect();
        let view = &*state;
        let signals = &view.signals;
        let dt = signals.dt_seconds;

        touched
            .par_iter()
            .filter_map(|id| {
                let (key, position) = positions.get(id.as_str())?;
                let cohort = cohorts.get(*key)?;
                let member = cohort.get(*position)?;
                let observed = node_observations(signals, id);
                let memberships = node_memberships(view, id);
                Some(compute_update(
                    member,
                    cohort,
                    *position,
                    observed,
                    memberships,
                    node_ema,
                    dt,
                    config,
                ))
            })
            .collect()
    };

    let now = state.now;
    for update in &updates {
        let Some(node) = state.node_mut(&update.id) else {
            continue;
        };
        for (signal, value) in &update.emas {
            set_node_ema(&mut node.stats, *signal, *value);
        }
        node.log_weight += update.delta_log_weight;
        for (entity, overlay) in &update.overlays {
            node.log_weight_overlays.insert(entity.clone(), *overlay);
        }
        let observed = interval_since(node.last_update_timestamp, now);
        node.stats.ema_update_interval = next_interval_ema(
            node.stats.ema_update_interval,
            node.stats.update_count,
            observed,
            config.ema_alpha,
        );
        node.stats.update_count += 1;
        node.last_update_timestamp = Some(now);
    }
    updates
}

/// Update every link touched this cycle. Returns the applied updates.
pub fn update_link_weights(state: &mut GraphState, config: &LearningConfig) -> Vec<WeightUpdate> {
    let touched = state.signals.touched();
    let updates: Vec<WeightUpdate> = {
        let mut cohorts: BTreeMap<(String, Scope), Vec<Member<'_, LinkStats>>> = BTreeMap::new();
        for link in state.links() {
            cohorts
                .entry((link.type_name().to_string(), link.scope))
                .or_default()
                .push(Member {
                    id: &link.id,
                    stats: &link.stats,
                    overlays: &link.log_weight_overlays,
                    update_interval: link.stats.ema_update_interval,
                    update_count: link.stats.update_count,
                });
        }
        let positions: BTreeMap<&str, (&(String, Scope), usize)> = cohorts
            .iter()
            .flat_map(|(key, members)| {
                members.iter().enumerate().map(move |(i, m)| (m.id, (key, i)))
            })
            .collect();
        let view = &*state;
        let signals = &view.signals;
        let dt = signals.dt_seconds;

        touched
            .par_iter()
            .filter_map(|id| {
                let (key, position) = positions.get(id.as_str())?;
                let cohort = cohorts.get(*key)?;
                let member = cohort.get(*position)?;
                let observed = link_observations(signals, id);
                if observed.is_empty() {
                    return None;
                }
                let memberships = link_memberships(view, id);
                Some(compute_update(
                    member,
                    cohort,
                    *position,
                    observed,
                    memberships,
                    link_ema,
                    dt,
                    config,
                ))
            })
            .collect()
    };

    let now = state.now;
    for update in &updates {
        let Some(link) = state.link_mut(&update.id) else {
            continue;
        };
        for (signal, value) in &update.emas {
            set_link_ema(&mut link.stats, *signal, *value);
        }
        link.log_weight += update.delta_log_weight;
        for (entity, overlay) in &update.overlays {
            link.log_weight_overlays.insert(entity.clone(), *overlay);
        }
        let observed = interval_since(link.last_update_timestamp, now);
        link.stats.ema_update_interval = next_interval_ema(
            link.stats.ema_update_interval,
            link.stats.update_count,
            observed,
            config.ema_alpha,
        );
        link.stats.update_count += 1;
        link.last_update_timestamp = Some(now);
    }
    updates
}
