//! Turning formation blocks into records, and scoring how well formed they are.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use substrate_core::stats::geometric_mean;
use substrate_core::{
    Confidence, FormationTrigger, GraphState, Link, LinkKind, Node, NodeContent, Scope,
    SubstrateResult,
};

use crate::trace::{LinkFormation, NodeFormation, ParsedTrace};

const QUALITY_FLOOR: f64 = 0.01;
const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_LINK_AFFECT: f64 = 0.5;

/// Keys that map onto universal record fields rather than content.
const UNIVERSAL_KEYS: &[&str] = &[
    "name",
    "description",
    "confidence",
    "formation_trigger",
    "scope",
    "created_by",
    "substrate",
    "source",
    "target",
    "goal",
    "mindstate",
    "energy",
];

const NODE_UNIVERSAL_REQUIRED: &[&str] = &["confidence", "formation_trigger"];
const LINK_UNIVERSAL_REQUIRED: &[&str] =
    &["goal", "mindstate", "energy", "confidence", "formation_trigger"];

/// What a batch of formations did to the state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormationOutcome {
    pub created_nodes: Vec<String>,
    pub superseded_nodes: Vec<String>,
    pub created_links: Vec<String>,
    pub superseded_links: Vec<String>,
    /// `(header line, reason)` for formations that were not applied.
    pub skipped: Vec<(usize, String)>,
    /// Formation quality per record id.
    pub qualities: BTreeMap<String, f64>,
}

impl FormationOutcome {
    pub fn records_written(&self) -> usize {
        self.created_nodes.len()
            + self.superseded_nodes.len()
            + self.created_links.len()
            + self.superseded_links.len()
    }
}

/// Geometric mean of completeness, grounding and novelty, each floored at 0.01.
pub fn formation_quality(completeness: f64, grounding: f64, novelty: f64) -> f64 {
    geometric_mean(&[completeness, grounding, novelty], QUALITY_FLOOR).clamp(0.0, 1.0)
}

/// Fraction of `required` keys present with a non-empty value. 1.0 when
/// nothing is required.
pub fn completeness(fields: &BTreeMap<String, String>, required: &[&str]) -> f64 {
    if required.is_empty() {
        return 1.0;
    }
    let present = required
        .iter()
        .filter(|k| fields.get(**k).is_some_and(|v| !v.trim().is_empty()))
        .count();
    present as f64 / required.len() as f64
}

fn text(fields: &BTreeMap<String, String>, key: &str) -> String {
    fields.get(key).cloned().unwrap_or_default()
}

fn list(fields: &BTreeMap<String, String>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn number(fields: &BTreeMap<String, String>, key: &str) -> Option<f64> {
    fields
        .get(key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn timestamp(fields: &BTreeMap<String, String>, key: &str) -> Option<DateTime<Utc>> {
    fields
        .get(key)
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn enum_key(fields: &BTreeMap<String, String>, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim().to_ascii_lowercase().replace([' ', '-'], "_"))
}

fn attributes(fields: &BTreeMap<String, String>) -> BTreeMap<String, serde_json::Value> {
    fields
        .iter()
        .filter(|(k, _)| !UNIVERSAL_KEYS.contains(&k.as_str()))
        .map(|(k, v)| {
            let value = match v.parse::<f64>() {
                Ok(n) if n.is_finite() => serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .unwrap_or_else(|| serde_json::Value::String(v.clone())),
                _ => match v.as_str() {
                    "true" => serde_json::Value::Bool(true),
                    "false" => serde_json::Value::Bool(false),
                    _ => serde_json::Value::String(v.clone()),
                },
            };
            (k.clone(), value)
        })
        .collect()
}

/// Content for a node formation. Unknown types become `Generic`.
pub fn node_content(
    type_name: &str,
    fields: &BTreeMap<String, String>,
    now: DateTime<Utc>,
) -> NodeContent {
    match type_name {
        "memory" => NodeContent::Memory {
            occurred_at: timestamp(fields, "occurred_at").unwrap_or(now),
            participants: list(fields, "participants"),
        },
        "concept" => NodeContent::Concept {
            definition: text(fields, "definition"),
        },
        "principle" => NodeContent::Principle {
            principle_statement: text(fields, "principle_statement"),
            why_it_matters: text(fields, "why_it_matters"),
        },
        "realization" => NodeContent::Realization {
            what_i_realized: text(fields, "what_i_realized"),
            context_when_discovered: text(fields, "context_when_discovered"),
        },
        "task" => NodeContent::Task {
            priority: text(fields, "priority"),
            estimated_hours: number(fields, "estimated_hours").unwrap_or(0.0),
            steps: list(fields, "steps"),
        },
        "goal" => NodeContent::Goal {
            goal_description: text(fields, "goal_description"),
            target_date: timestamp(fields, "target_date"),
        },
        "person" => NodeContent::Person {
            role: text(fields, "role"),
            relationship_type: text(fields, "relationship_type"),
        },
        "mechanism" => NodeContent::Mechanism {
            how_it_works: text(fields, "how_it_works"),
            inputs: list(fields, "inputs"),
            outputs: list(fields, "outputs"),
        },
        other => NodeContent::Generic {
            type_name: other.to_string(),
            attributes: attributes(fields),
        },
    }
}

/// Kind for a link formation. Unknown types become `Generic`.
pub fn link_kind(type_name: &str, fields: &BTreeMap<String, String>) -> LinkKind {
    match type_name {
        "enables" => LinkKind::Enables {
            enabling_type: text(fields, "enabling_type"),
            degree_of_necessity: text(fields, "degree_of_necessity"),
        },
        "blocks" => LinkKind::Blocks {
            blocking_condition: text(fields, "blocking_condition"),
            severity: number(fields, "severity").unwrap_or(0.0),
        },
        "relates_to" => LinkKind::RelatesTo {
            relationship_strength: text(fields, "relationship_strength"),
        },
        "requires" => LinkKind::Requires {
            requirement_criticality: text(fields, "requirement_criticality"),
        },
        "suppresses" => LinkKind::Suppresses {
            suppression_mechanism: text(fields, "suppression_mechanism"),
        },
        "justified_by" => LinkKind::JustifiedBy {
            justification_type: text(fields, "justification_type"),
            justification_strength: text(fields, "justification_strength"),
        },
        other => LinkKind::Generic {
            type_name: other.to_string(),
            attributes: attributes(fields),
        },
    }
}

fn node_required(type_name: &str) -> Vec<&'static str> {
    let mut required: Vec<&'static str> = NodeContent::required_fields(type_name).to_vec();
    if !NodeContent::BUILTIN_TYPES.contains(&type_name) {
        required.push("description");
    }
    required.extend_from_slice(NODE_UNIVERSAL_REQUIRED);
    required
}

fn link_required(type_name: &str) -> Vec<&'static str> {
    let mut required: Vec<&'static str> = LinkKind::required_fields(type_name).to_vec();
    required.extend_from_slice(LINK_UNIVERSAL_REQUIRED);
    required
}

fn declared_confidence(fields: &BTreeMap<String, String>) -> f64 {
    number(fields, "confidence")
        .map(|c| Confidence::new(c).value())
        .unwrap_or(DEFAULT_CONFIDENCE)
}

fn apply_node(
    state: &mut GraphState,
    formation: &NodeFormation,
    agent: &str,
    outcome: &mut FormationOutcome,
) -> SubstrateResult<()> {
    let now = state.now;
    let fields = &formation.fields;
    let id = formation.id().to_string();
    let content = node_content(&formation.type_name, fields, now);
    let hash = Node::compute_content_hash(&content);
    let confidence = declared_confidence(fields);
    let trigger = enum_key(fields, "formation_trigger")
        .and_then(|t| FormationTrigger::parse(&t))
        .unwrap_or_default();
    let scope = enum_key(fields, "scope")
        .and_then(|s| Scope::parse(&s))
        .unwrap_or_default();

    let novelty = match state.node(&id) {
        Some(existing) if existing.content_hash == hash => QUALITY_FLOOR,
        Some(_) => 0.5,
        None if state.nodes().any(|n| n.content_hash == hash) => 0.25,
        None => 1.0,
    };
    let quality = formation_quality(
        completeness(fields, &node_required(&formation.type_name)),
        confidence,
        novelty,
    );
    outcome.qualities.insert(id.clone(), quality);
    state.signals.formations.insert(id.clone(), quality);

    let mut next = match state.node(&id) {
        Some(existing) if existing.content_hash == hash => {
            debug!(id = %id, "re-formation with identical content, nothing to write");
            return Ok(());
        }
        Some(existing) => {
            let next = existing.next_version(content, now);
            outcome.superseded_nodes.push(id.clone());
            next
        }
        None => {
            outcome.created_nodes.push(id.clone());
            Node::new(id.clone(), id.clone(), content, now)
        }
    };
    if let Some(description) = fields.get("description") {
        next.description = description.clone();
    }
    next.confidence = Confidence::new(confidence);
    next.formation_trigger = trigger;
    next.scope = scope;
    next.created_by = fields.get("created_by").cloned().unwrap_or_else(|| agent.to_string());
    if let Some(origin) = fields.get("substrate") {
        next.substrate_origin = origin.clone();
    }

    if next.supersedes.is_some() {
        state.supersede_node(next)
    } else {
        state.insert_node(next)
    }
}

fn apply_link(
    state: &mut GraphState,
    formation: &LinkFormation,
    agent: &str,
    outcome: &mut FormationOutcome,
) -> SubstrateResult<()> {
    let now = state.now;
    let fields = &formation.fields;
    let (source, target) = (formation.source(), formation.target());
    for endpoint in [source, target] {
        if !state.contains_node(endpoint) {
            warn!(line = formation.line, endpoint, "link formation names an unknown node");
            outcome
                .skipped
                .push((formation.line, format!("unknown endpoint `{endpoint}`")));
            return Ok(());
        }
    }

    let kind = link_kind(&formation.type_name, fields);
    let affect = number(fields, "energy").unwrap_or(DEFAULT_LINK_AFFECT);
    let confidence = declared_confidence(fields);
    let id = Link::logical_id(source, target, kind.type_name());

    let novelty = match state.link(&id) {
        Some(existing) if existing.kind == kind && existing.energy() == affect => QUALITY_FLOOR,
        Some(_) => 0.5,
        None => 1.0,
    };
    let quality = formation_quality(
        completeness(fields, &link_required(&formation.type_name)),
        confidence,
        novelty,
    );
    outcome.qualities.insert(id.clone(), quality);
    state.signals.formations.insert(id.clone(), quality);

    let mut next = match state.link(&id) {
        Some(existing) if existing.kind == kind && existing.energy() == affect => {
            debug!(id = %id, "re-formation with identical content, nothing to write");
            return Ok(());
        }
        Some(existing) => {
            let next = existing.next_version(kind, affect, now);
            outcome.superseded_links.push(id.clone());
            next
        }
        None => {
            outcome.created_links.push(id.clone());
            Link::new(source, target, kind, affect, now)
        }
    };
    next.goal = text(fields, "goal");
    next.mindstate = text(fields, "mindstate");
    next.confidence = Confidence::new(confidence);
    next.formation_trigger = enum_key(fields, "formation_trigger")
        .and_then(|t| FormationTrigger::parse(&t))
        .unwrap_or_default();
    if let Some(scope) = enum_key(fields, "scope").and_then(|s| Scope::parse(&s)) {
        next.scope = scope;
    }
    next.created_by = fields.get("created_by").cloned().unwrap_or_else(|| agent.to_string());

    if next.supersedes.is_some() {
        state.supersede_link(next)
    } else {
        state.insert_link(next)
    }
}

/// Apply node formations first, then links, so a trace can form a node and
/// link to it in one go. Links to unknown nodes are skipped, not errors.
pub fn apply_formations(
    state: &mut GraphState,
    parsed: &ParsedTrace,
    agent: &str,
) -> SubstrateResult<FormationOutcome> {
    let mut outcome = FormationOutcome::default();
    for formation in &parsed.node_formations {
        apply_node(state, formation, agent, &mut outcome)?;
    }
    for formation in &parsed.link_formations {
        apply_link(state, formation, agent, &mut outcome)?;
    }
    debug!(
        written = outcome.records_written(),
        skipped = outcome.skipped.len(),
        "formations applied"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn completeness_counts_non_empty_fields() {
        let f = fields(&[("a", "x"), ("b", " ")]);
        assert_eq!(completeness(&f, &["a", "b"]), 0.5);
        assert_eq!(completeness(&f, &[]), 1.0);
    }

    #[test]
    fn quality_is_floored_geometric_mean() {
        assert!((formation_quality(1.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        let q = formation_quality(0.0, 1.0, 1.0);
        assert!((q - 0.01f64.cbrt()).abs() < 1e-12);
    }

    #[test]
    fn unknown_types_become_generic() {
        let f = fields(&[("name", "p"), ("behaviour", "x"), ("weight", "2")]);
        match node_content("personal_pattern", &f, chrono::Utc::now()) {
            NodeContent::Generic { type_name, attributes } => {
                assert_eq!(type_name, "personal_pattern");
                assert!(!attributes.contains_key("name"));
                assert_eq!(attributes["weight"], serde_json::json!(2.0));
            }
            other => panic!("expected generic, got {other:?}"),
        }
    }
}
