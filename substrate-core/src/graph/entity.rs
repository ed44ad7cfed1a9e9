use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{EntityKind, Scope, StabilityState};
use super::temporal::Bitemporal;
use super::usage::EntityStats;

/// A named neighbourhood of nodes with weighted membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub vid: String,
    pub name: String,
    pub description: String,
    pub kind: EntityKind,
    pub scope: Scope,
    /// node id → membership weight in [0, 1].
    pub members: BTreeMap<String, f64>,
    pub energy: f64,
    pub threshold: f64,
    pub log_weight: f64,
    pub stability_state: StabilityState,
    pub frames_since_creation: u64,
    pub stats: EntityStats,
    pub quality_score: f64,
    pub high_quality_streak: u32,
    pub low_quality_streak: u32,
    pub centroid: Option<Vec<f32>>,
    pub temporal: Bitemporal,
    pub supersedes: Option<String>,
    pub superseded_by: Option<String>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EntityKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            vid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            kind,
            scope: Scope::default(),
            members: BTreeMap::new(),
            energy: 0.0,
            threshold: 0.0,
            log_weight: 0.0,
            stability_state: StabilityState::Runtime,
            frames_since_creation: 0,
            stats: EntityStats::default(),
            quality_score: 0.0,
            high_quality_streak: 0,
            low_quality_streak: 0,
            centroid: None,
            temporal: Bitemporal::new(now),
            supersedes: None,
            superseded_by: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_member(mut self, node_id: impl Into<String>, weight: f64) -> Self {
        self.add_member(node_id, weight);
        self
    }

    /// Insert or replace a member. Weight is clamped to [0, 1].
    pub fn add_member(&mut self, node_id: impl Into<String>, weight: f64) {
        let weight = if weight.is_finite() { weight.clamp(0.0, 1.0) } else { 0.0 };
        self.members.insert(node_id.into(), weight);
    }

    pub fn is_functional(&self) -> bool {
        self.kind == EntityKind::Functional
    }

    pub fn is_dissolved(&self) -> bool {
        self.stability_state == StabilityState::Dissolved
    }

    pub fn is_active(&self) -> bool {
        self.energy > 0.0 && self.energy >= self.threshold
    }
}
