use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::content::LinkKind;
use super::enums::{FormationTrigger, Scope};
use super::temporal::{truncate_millis, Bitemporal};
use super::usage::LinkStats;

/// A directed, typed relationship between two node ids.
///
/// Links carry no transferable energy. `energy()` is the affective intensity
/// declared at formation and cannot change afterwards; what flowed through the
/// link lives in `last_flow` and `flow_total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Logical id, shared by every version of this link.
    pub id: String,
    pub vid: String,
    pub source: String,
    pub target: String,
    pub kind: LinkKind,
    pub scope: Scope,
    /// Why the link was formed.
    pub goal: String,
    pub mindstate: String,
    pub confidence: Confidence,
    pub formation_trigger: FormationTrigger,
    pub created_by: String,
    pub substrate_origin: String,
    pub temporal: Bitemporal,
    pub supersedes: Option<String>,
    pub superseded_by: Option<String>,
    affect: f64,
    pub log_weight: f64,
    pub stats: LinkStats,
    pub precedence_forward: f64,
    pub precedence_backward: f64,
    /// Energy moved across this link in the most recent cycle it was used.
    pub last_flow: f64,
    pub flow_total: f64,
    pub last_update_timestamp: Option<DateTime<Utc>>,
    /// entity id → emotion axis → value.
    pub entity_emotions: BTreeMap<String, BTreeMap<String, f64>>,
    /// entity id → log-weight offset learned in that entity's context.
    pub log_weight_overlays: BTreeMap<String, f64>,
}

impl Link {
    /// `affect` is clamped to [0, 1] and fixed for the life of this version.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: LinkKind,
        affect: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        let id = Self::logical_id(&source, &target, kind.type_name());
        Self {
            id,
            vid: uuid::Uuid::new_v4().to_string(),
            source,
            target,
            kind,
            scope: Scope::default(),
            goal: String::new(),
            mindstate: String::new(),
            confidence: Confidence::default(),
            formation_trigger: FormationTrigger::default(),
            created_by: String::new(),
            substrate_origin: String::new(),
            temporal: Bitemporal::new(now),
            supersedes: None,
            superseded_by: None,
            affect: if affect.is_finite() { affect.clamp(0.0, 1.0) } else { 0.0 },
            log_weight: 0.0,
            stats: LinkStats::default(),
            precedence_forward: 0.0,
            precedence_backward: 0.0,
            last_flow: 0.0,
            flow_total: 0.0,
            last_update_timestamp: None,
            entity_emotions: BTreeMap::new(),
            log_weight_overlays: BTreeMap::new(),
        }
    }

    /// `source->target:type`, stable across versions.
    pub fn logical_id(source: &str, target: &str, type_name: &str) -> String {
        format!("{source}->{target}:{type_name}")
    }

    /// Declared affective intensity in [0, 1].
    pub fn energy(&self) -> f64 {
        self.affect
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_mindstate(mut self, mindstate: impl Into<String>) -> Self {
        self.mindstate = mindstate.into();
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

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn weight(&self) -> f64 {
        self.log_weight.exp()
    }

    pub fn effective_log_weight(&self, entity: Option<&str>) -> f64 {
        let overlay = entity
            .and_then(|e| self.log_weight_overlays.get(e))
            .copied()
            .unwrap_or(0.0);
        self.log_weight + overlay
    }

    /// Current version and valid at `t`.
    pub fn is_live_at(&self, t: DateTime<Utc>) -> bool {
        self.temporal.is_live_at(t)
    }

    /// Record the energy that moved across the link this cycle.
    pub fn record_flow(&mut self, amount: f64) {
        self.last_flow = amount;
        self.flow_total += amount;
    }

    /// Source share for a stimulus aimed at the link as a whole.
    ///
    /// Laplace-smoothed so an unobserved link splits evenly.
    pub fn source_share(&self) -> f64 {
        let forward = self.precedence_forward.max(0.0);
        let backward = self.precedence_backward.max(0.0);
        (forward + 1.0) / (forward + backward + 2.0)
    }

    /// Next version with new content. Affect is re-declared by the caller.
    /// The caller is responsible for expiring `self`.
    pub fn next_version(&self, kind: LinkKind, affect: f64, now: DateTime<Utc>) -> Self {
        let mut next = Link::new(self.source.clone(), self.target.clone(), kind, affect, now);
        next.id = self.id.clone();
        next.scope = self.scope;
        next.goal = self.goal.clone();
        next.mindstate = self.mindstate.clone();
        next.confidence = self.confidence;
        next.formation_trigger = self.formation_trigger;
        next.created_by = self.created_by.clone();
        next.substrate_origin = self.substrate_origin.clone();
        next.log_weight = self.log_weight;
        next.stats = self.stats;
        next.precedence_forward = self.precedence_forward;
        next.precedence_backward = self.precedence_backward;
        next.flow_total = self.flow_total;
        next.last_update_timestamp = self.last_update_timestamp;
        next.entity_emotions = self.entity_emotions.clone();
        next.log_weight_overlays = self.log_weight_overlays.clone();
        next.temporal = Bitemporal::new(truncate_millis(now));
        next.supersedes = Some(self.vid.clone());
        next
    }
}
