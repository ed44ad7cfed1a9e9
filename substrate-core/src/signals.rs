//! Per-cycle scratch written by one mechanism and read by the next.
//!
//! Cleared at the start of every cycle. Nothing here is persisted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::StabilityState;

/// A change of an entity's active state in this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFlip {
    pub entity_id: String,
    pub became_active: bool,
    pub energy: f64,
    pub threshold: f64,
}

/// A lifecycle state change. Never produced for functional entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleTransition {
    pub entity_id: String,
    pub from: StabilityState,
    pub to: StabilityState,
    pub quality: f64,
    pub age: u64,
    pub reason: String,
}

/// How many sub-traversals ran this cycle and how many finished their work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalTally {
    pub started: usize,
    /// Ended by budget depletion or by running out of candidates.
    pub completed: usize,
    /// Ended by hitting the stride cap with budget left.
    pub capped: usize,
    pub strides: usize,
}

impl TraversalTally {
    /// Completed over started; 1.0 when nothing ran.
    pub fn completion_rate(&self) -> f64 {
        if self.started == 0 {
            1.0
        } else {
            self.completed as f64 / self.started as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSignals {
    /// Seconds since the previous cycle.
    pub dt_seconds: f64,
    /// Summed usage-mark deltas by record id (nodes or links).
    pub marks: BTreeMap<String, f64>,
    /// Formation quality by record id, for records formed this cycle.
    pub formations: BTreeMap<String, f64>,
    /// Nodes selected into working memory.
    pub wm_nodes: BTreeSet<String>,
    /// Best gap-closure utility per link this cycle.
    pub gap_closures: BTreeMap<String, f64>,
    /// Energy moved per link this cycle.
    pub flows: BTreeMap<String, f64>,
    pub active_before: BTreeSet<String>,
    pub active_nodes: BTreeSet<String>,
    pub frontier: BTreeSet<String>,
    pub active_entities: BTreeSet<String>,
    pub entity_flips: Vec<EntityFlip>,
    pub traversals: TraversalTally,
    pub transitions: Vec<LifecycleTransition>,
    /// Energy added by stimuli before the cycle's first snapshot.
    pub injected_energy: f64,
    /// Energy removed by decay this cycle.
    pub decayed_energy: f64,
}

impl CycleSignals {
    pub fn new(dt_seconds: f64) -> Self {
        Self {
            dt_seconds,
            ..Self::default()
        }
    }

    /// Add a usage-mark delta for a record.
    pub fn add_mark(&mut self, record_id: impl Into<String>, delta: f64) {
        *self.marks.entry(record_id.into()).or_insert(0.0) += delta;
    }

    /// Links that carried energy this cycle.
    pub fn active_links(&self) -> BTreeSet<String> {
        self.flows
            .iter()
            .filter(|(_, flow)| **flow > 0.0)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Records any learning signal touched this cycle.
    pub fn touched(&self) -> BTreeSet<String> {
        self.marks
            .keys()
            .chain(self.formations.keys())
            .chain(self.wm_nodes.iter())
            .chain(self.gap_closures.keys())
            .chain(self.flows.keys())
            .cloned()
            .collect()
    }
}
