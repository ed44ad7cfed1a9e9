use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::content::NodeContent;
use super::enums::{FormationTrigger, Scope};
use super::temporal::{truncate_millis, Bitemporal};
use super::usage::NodeStats;

/// Per-entity view of a node's activation, stored as a JSON blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityActivation {
    pub energy: f64,
    pub last_activated_cycle: u64,
}

/// A unit of knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Logical id, shared by every version of this node.
    pub id: String,
    /// Version id, unique per version.
    pub vid: String,
    pub name: String,
    pub description: String,
    pub content: NodeContent,
    pub scope: Scope,
    pub confidence: Confidence,
    pub formation_trigger: FormationTrigger,
    pub created_by: String,
    pub substrate_origin: String,
    pub temporal: Bitemporal,
    /// Version id this version replaced.
    pub supersedes: Option<String>,
    /// Version id that replaced this one.
    pub superseded_by: Option<String>,
    /// Current activation. Never negative.
    pub energy: f64,
    pub threshold: f64,
    /// Long-run importance in log space.
    pub log_weight: f64,
    pub stats: NodeStats,
    pub last_update_timestamp: Option<DateTime<Utc>>,
    pub entity_activations: BTreeMap<String, EntityActivation>,
    /// entity id → log-weight offset learned in that entity's context.
    pub log_weight_overlays: BTreeMap<String, f64>,
    pub embedding: Option<Vec<f32>>,
    /// blake3 of the serialized content.
    pub content_hash: String,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content: NodeContent,
        now: DateTime<Utc>,
    ) -> Self {
        let content = content.with_millisecond_precision();
        let content_hash = Self::compute_content_hash(&content);
        Self {
            id: id.into(),
            vid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            content,
            scope: Scope::default(),
            confidence: Confidence::default(),
            formation_trigger: FormationTrigger::default(),
            created_by: String::new(),
            substrate_origin: String::new(),
            temporal: Bitemporal::new(now),
            supersedes: None,
            superseded_by: None,
            energy: 0.0,
            threshold: 0.0,
            log_weight: 0.0,
            stats: NodeStats::default(),
            last_update_timestamp: None,
            entity_activations: BTreeMap::new(),
            log_weight_overlays: BTreeMap::new(),
            embedding: None,
            content_hash,
        }
    }

    /// blake3 hash of the serialized content, used to spot no-op re-formations.
    pub fn compute_content_hash(content: &NodeContent) -> String {
        match serde_json::to_vec(content) {
            Ok(bytes) => blake3::hash(&bytes).to_hex().to_string(),
            Err(_) => blake3::hash(content.type_name().as_bytes()).to_hex().to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Confidence::new(confidence);
        self
    }

    pub fn with_trigger(mut self, trigger: FormationTrigger) -> Self {
        self.formation_trigger = trigger;
        self
    }

    pub fn with_origin(
        mut self,
        created_by: impl Into<String>,
        substrate_origin: impl Into<String>,
    ) -> Self {
        self.created_by = created_by.into();
        self.substrate_origin = substrate_origin.into();
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy.max(0.0);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn type_name(&self) -> &str {
        self.content.type_name()
    }

    /// Linear importance.
    pub fn weight(&self) -> f64 {
        self.log_weight.exp()
    }

    /// `log_weight` plus the overlay for `entity`, if any.
    pub fn effective_log_weight(&self, entity: Option<&str>) -> f64 {
        let overlay = entity
            .and_then(|e| self.log_weight_overlays.get(e))
            .copied()
            .unwrap_or(0.0);
        self.log_weight + overlay
    }

    pub fn is_active(&self) -> bool {
        self.energy > 0.0 && self.energy >= self.threshold
    }

    /// `max(0, energy − threshold)`.
    pub fn surplus(&self) -> f64 {
        (self.energy - self.threshold).max(0.0)
    }

    /// Deficit to reach threshold.
    pub fn gap(&self) -> f64 {
        (self.threshold - self.energy).max(0.0)
    }

    /// Adds `delta`, flooring the result at zero. Returns the applied change.
    pub fn add_energy(&mut self, delta: f64) -> f64 {
        let before = self.energy;
        self.energy = (self.energy + delta).max(0.0);
        self.energy - before
    }

    pub fn is_dormant(&self, dormant_weight: f64) -> bool {
        self.weight() < dormant_weight
    }

    /// Next version of this node, carrying dynamics over and linking versions.
    /// The caller is responsible for expiring `self`.
    pub fn next_version(&self, content: NodeContent, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.content = content.with_millisecond_precision();
        next.content_hash = Self::compute_content_hash(&next.content);
        next.vid = uuid::Uuid::new_v4().to_string();
        next.temporal = Bitemporal::new(truncate_millis(now));
        next.supersedes = Some(self.vid.clone());
        next.superseded_by = None;
        next
    }
}
