#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use substrate_core::graph::EntityActivation;
use substrate_core::{
    Entity, EntityKind, FormationTrigger, Link, LinkKind, Node, NodeContent, Scope,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap() + Duration::microseconds(589_793)
}

pub fn every_node_content() -> Vec<NodeContent> {
    vec![
        NodeContent::Memory {
            occurred_at: t0() - Duration::days(3),
            participants: vec!["ada".into(), "grace".into()],
        },
        NodeContent::Concept {
            definition: "a named pattern of co-activation".into(),
        },
        NodeContent::Principle {
            principle_statement: "prefer evidence over recency".into(),
            why_it_matters: "recency is noisy".into(),
        },
        NodeContent::Realization {
            what_i_realized: "thresholds must be cohort-relative".into(),
            context_when_discovered: "tuning decay".into(),
        },
        NodeContent::Task {
            priority: "high".into(),
            estimated_hours: 2.5,
            steps: vec![],
        },
        NodeContent::Goal {
            goal_description: "stable recall".into(),
            target_date: Some(t0() + Duration::days(30)),
        },
        NodeContent::Person {
            role: "maintainer".into(),
            relationship_type: "colleague".into(),
        },
        NodeContent::Mechanism {
            how_it_works: "spreads surplus".into(),
            inputs: vec!["energy".into()],
            outputs: vec!["flow".into(), "flips".into()],
        },
        NodeContent::Generic {
            type_name: "hypothesis".into(),
            attributes: BTreeMap::from([
                ("status".to_string(), json!("open")),
                ("support".to_string(), json!(0.35)),
                ("tags".to_string(), json!(["a", "b"])),
            ]),
        },
    ]
}

pub fn every_link_kind() -> Vec<LinkKind> {
    vec![
        LinkKind::Enables {
            enabling_type: "prerequisite".into(),
            degree_of_necessity: "required".into(),
        },
        LinkKind::Blocks {
            blocking_condition: "missing data".into(),
            severity: 0.75,
        },
        LinkKind::RelatesTo {
            relationship_strength: "strong".into(),
        },
        LinkKind::Requires {
            requirement_criticality: "blocking".into(),
        },
        LinkKind::Suppresses {
            suppression_mechanism: "inhibition".into(),
        },
        LinkKind::JustifiedBy {
            justification_type: "empirical".into(),
            justification_strength: "moderate".into(),
        },
        LinkKind::Generic {
            type_name: "contrasts_with".into(),
            attributes: BTreeMap::from([("axis".to_string(), json!("scale"))]),
        },
    ]
}

/// A node with every dynamic field set to something non-default.
pub fn rich_node(id: &str, content: NodeContent) -> Node {
    let mut node = Node::new(id, format!("node {id}"), content, t0())
        .with_description("fixture")
        .with_scope(Scope::Organizational)
        .with_confidence(0.8)
        .with_trigger(FormationTrigger::SystematicAnalysis)
        .with_origin("tester", "fixtures")
        .with_energy(1.234_567_891)
        .with_embedding(vec![0.1, -0.2, 0.3]);
    node.threshold = 0.4;
    node.log_weight = -0.731;
    node.stats.ema_reinforcement = 0.3;
    node.stats.ema_update_interval = 12.5;
    node.stats.update_count = 4;
    node.last_update_timestamp = Some(node.temporal.created_at);
    node.entity_activations.insert(
        "e1".into(),
        EntityActivation {
            energy: 0.25,
            last_activated_cycle: 17,
        },
    );
    node
}

pub fn rich_link(source: &str, target: &str, kind: LinkKind) -> Link {
    let mut link = Link::new(source, target, kind, 0.6, t0())
        .with_goal("connect")
        .with_mindstate("curious")
        .with_confidence(0.9)
        .with_origin("tester", "fixtures");
    link.log_weight = 0.42;
    link.stats.ema_gap_closure = 0.2;
    link.precedence_forward = 3.0;
    link.precedence_backward = 1.0;
    link.record_flow(0.125);
    link.entity_emotions.insert(
        "e1".into(),
        BTreeMap::from([("joy".to_string(), 0.5), ("fear".to_string(), 0.1)]),
    );
    link
}

pub fn rich_entity(id: &str) -> Entity {
    let mut entity = Entity::new(id, format!("entity {id}"), EntityKind::Emergent, t0())
        .with_member("n0", 0.9)
        .with_member("n1", 0.4);
    entity.energy = 0.7;
    entity.threshold = 0.2;
    entity.frames_since_creation = 250;
    entity.quality_score = 0.61;
    entity.high_quality_streak = 3;
    entity.centroid = Some(vec![0.5, 0.5, 0.0]);
    entity
}
