use chrono::Duration;
use proptest::prelude::*;

use substrate_core::config::LearningConfig;
use substrate_core::graph::temporal::now_millis;
use substrate_core::traits::Mechanism;
use substrate_core::{Entity, EntityKind, GraphState, Link, LinkKind, Record};
use substrate_learning::cohort::cohort_z;
use substrate_learning::{
    apply_formations, parse_trace, update_link_weights, update_node_weights, LearningMechanism,
};
use test_fixtures::{concept_node, ring_graph};

const TRACE: &str = r#"
Nicolas asks about the schema registry [n0001: very useful]
and the automation idea [n0002: useful], while [n0003: misleading] was noise.

[NODE_FORMATION: Principle]
name: "schema_as_truth"
principle_statement: "The registry is the authoritative source"
why_it_matters: "Docs never drift"
confidence: 0.9
formation_trigger: "systematic_analysis"

[LINK_FORMATION: ENABLES]
source: "schema_as_truth"
target: "n0001"
goal: "Queryable schema enables generated docs"
mindstate: "Clarity"
energy: 0.85
confidence: 0.9
formation_trigger: "spontaneous_insight"
enabling_type: "prerequisite"
degree_of_necessity: "required"
"#;

#[test]
fn trace_yields_marks_and_formations() {
    let parsed = parse_trace(TRACE).unwrap();
    let ids: Vec<&str> = parsed.marks.iter().map(|m| m.record_id.as_str()).collect();
    assert_eq!(ids, ["n0001", "n0002", "n0003"]);
    assert_eq!(parsed.node_formations.len(), 1);
    assert_eq!(parsed.node_formations[0].type_name, "principle");
    assert_eq!(parsed.node_formations[0].id(), "schema_as_truth");
    assert_eq!(parsed.link_formations.len(), 1);
    assert_eq!(parsed.link_formations[0].type_name, "enables");
    assert_eq!(parsed.link_formations[0].fields["energy"], "0.85");
}

#[test]
fn block_without_name_is_malformed() {
    let err = parse_trace("[NODE_FORMATION: Concept]\ndefinition: x\n").unwrap_err();
    assert!(err.to_string().contains("line 1"), "{err}");
}

#[test]
fn formations_create_records_with_quality() {
    let now = now_millis();
    let mut state = ring_graph(4, now);
    let parsed = parse_trace(TRACE).unwrap();
    parsed.record_marks(&mut state.signals);
    let outcome = apply_formations(&mut state, &parsed, "tester").unwrap();

    assert_eq!(outcome.created_nodes, ["schema_as_truth"]);
    assert_eq!(outcome.created_links.len(), 1);
    let node = state.node("schema_as_truth").unwrap();
    assert_eq!(node.type_name(), "principle");
    assert_eq!(node.created_by, "tester");
    let q = state.signals.formations["schema_as_truth"];
    assert!((q - 0.9f64.cbrt()).abs() < 1e-9, "quality {q}");

    let link = state.link(&outcome.created_links[0]).unwrap();
    assert_eq!(link.energy(), 0.85);
    assert_eq!(state.signals.marks["n0003"], -3.0);
}

#[test]
fn re_formation_with_new_content_supersedes() {
    let now = now_millis();
    let mut state = ring_graph(2, now);
    let first = parse_trace("[NODE_FORMATION: Concept]\nname: c\ndefinition: one\n").unwrap();
    apply_formations(&mut state, &first, "a").unwrap();
    let first_vid = state.node("c").unwrap().vid.clone();

    let second = parse_trace("[NODE_FORMATION: Concept]\nname: c\ndefinition: two\n").unwrap();
    let outcome = apply_formations(&mut state, &second, "a").unwrap();
    assert_eq!(outcome.superseded_nodes, ["c"]);
    let current = state.node("c").unwrap();
    assert_eq!(current.supersedes.as_deref(), Some(first_vid.as_str()));
    assert!(matches!(&state.retired()[0], Record::Node(n) if n.vid == first_vid));

    let unchanged = apply_formations(&mut state, &second, "a").unwrap();
    assert_eq!(unchanged.records_written(), 0);
}

#[test]
fn link_to_unknown_node_is_skipped() {
    let mut state = ring_graph(2, now_millis());
    let parsed = parse_trace("[LINK_FORMATION: RELATES_TO]\nsource: n0000\ntarget: ghost\n").unwrap();
    let outcome = apply_formations(&mut state, &parsed, "a").unwrap();
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(state.link_count(), 2);
}

fn cohort(n: usize) -> GraphState {
    let now = now_millis();
    let mut state = GraphState::new(now);
    for i in 0..n {
        state.insert_node(concept_node(&format!("c{i}"), 0.0, now)).unwrap();
    }
    state
}

#[test]
fn weight_rises_monotonically_under_positive_evidence() {
    let start = now_millis();
    let mut state = cohort(6);
    let config = LearningConfig::default();
    let mut previous = state.node("c0").unwrap().log_weight;

    for cycle in 1..=15u64 {
        state.begin_cycle(cycle, start + Duration::seconds(cycle as i64 * 10), 10.0);
        state.signals.add_mark("c0", 3.0);
        let updates = update_node_weights(&mut state, &config);
        assert_eq!(updates.len(), 1);
        let w = state.node("c0").unwrap().log_weight;
        assert!(w > previous, "cycle {cycle}: {w} <= {previous}");
        previous = w;
    }
    assert!(state.nodes().filter(|n| n.id != "c0").all(|n| n.log_weight == 0.0));
}

#[test]
fn weight_keeps_rising_while_peers_hold_working_memory() {
    let start = now_millis();
    let mut state = cohort(6);
    let config = LearningConfig::default();
    let mut previous = state.node("c0").unwrap().log_weight;

    for cycle in 1..=8u64 {
        state.begin_cycle(cycle, start + Duration::seconds(cycle as i64 * 10), 10.0);
        state.signals.add_mark("c0", 3.0);
        for peer in 1..6 {
            state.signals.wm_nodes.insert(format!("c{peer}"));
        }
        let updates = update_node_weights(&mut state, &config);
        let own = updates.iter().find(|u| u.id == "c0").unwrap();
        assert!(own.z_sum > 0.0, "cycle {cycle}: z {}", own.z_sum);
        let w = state.node("c0").unwrap().log_weight;
        assert!(w > previous, "cycle {cycle}: {w} <= {previous}");
        previous = w;
    }
    // absence from working memory still decays the presence EMA
    assert_eq!(state.node("c0").unwrap().stats.ema_wm_presence, 0.0);
    assert!(state.node("c1").unwrap().stats.ema_wm_presence > 0.0);
}

fn with_active_entity(state: &mut GraphState, membership: f64) {
    let now = state.now;
    let entity = Entity::new("e", "e", EntityKind::Emergent, now).with_member("c0", membership);
    state.insert_entity(entity).unwrap();
}

#[test]
fn marks_inside_an_active_entity_mostly_land_on_its_overlay() {
    let start = now_millis();
    let mut state = cohort(6);
    with_active_entity(&mut state, 0.5);
    let config = LearningConfig::default();

    state.begin_cycle(1, start, 1.0);
    state.signals.active_entities.insert("e".to_string());
    state.signals.add_mark("c0", 3.0);
    let updates = update_node_weights(&mut state, &config);
    assert_eq!(updates[0].overlays.len(), 1);

    let node = state.node("c0").unwrap();
    let overlay = node.log_weight_overlays["e"];
    assert!(node.log_weight > 0.0);
    // 0.8 · 0.5 membership against the 0.2 global share
    assert!((overlay - 2.0 * node.log_weight).abs() < 1e-12);
    assert!(node.effective_log_weight(Some("e")) > node.effective_log_weight(None));
}

#[test]
fn inactive_entity_gets_no_overlay() {
    let start = now_millis();
    let mut state = cohort(6);
    with_active_entity(&mut state, 1.0);
    state.begin_cycle(1, start, 1.0);
    state.signals.add_mark("c0", 3.0);
    update_node_weights(&mut state, &LearningConfig::default());
    assert!(state.node("c0").unwrap().log_weight_overlays.is_empty());
}

#[test]
fn overlay_is_clamped_to_the_cap() {
    let start = now_millis();
    let mut state = cohort(6);
    with_active_entity(&mut state, 1.0);
    let config = LearningConfig {
        overlay_cap: 0.05,
        ..LearningConfig::default()
    };
    for cycle in 1..=20u64 {
        state.begin_cycle(cycle, start + Duration::seconds(cycle as i64 * 10), 10.0);
        state.signals.active_entities.insert("e".to_string());
        state.signals.add_mark("c0", 3.0);
        update_node_weights(&mut state, &config);
    }
    assert_eq!(state.node("c0").unwrap().log_weight_overlays["e"], 0.05);
}

#[test]
fn first_update_uses_first_rate_then_adapts() {
    let start = now_millis();
    let mut state = cohort(2);
    let config = LearningConfig::default();

    state.begin_cycle(1, start, 1.0);
    state.signals.add_mark("c0", 2.0);
    let first = update_node_weights(&mut state, &config);
    assert_eq!(first[0].eta, 0.15);
    // cohort of two is below the minimum: z is the raw EMA 0.2, and the
    // global weight takes its 0.2 share
    assert!((first[0].delta_log_weight - 0.2 * 0.15 * 0.2).abs() < 1e-12);

    state.begin_cycle(2, start + Duration::seconds(60), 60.0);
    state.signals.add_mark("c0", 2.0);
    update_node_weights(&mut state, &config);
    state.begin_cycle(3, start + Duration::seconds(120), 60.0);
    state.signals.add_mark("c0", 2.0);
    let third = update_node_weights(&mut state, &config);
    // τ̂ = 60 s, Δt = 60 s
    assert!((third[0].eta - (1.0 - (-1.0f64).exp())).abs() < 1e-9);
}

#[test]
fn link_signals_update_link_stats() {
    let now = now_millis();
    let mut state = ring_graph(3, now);
    let id = Link::logical_id("n0000", "n0001", LinkKind::relates_to().type_name());
    state.begin_cycle(1, now, 1.0);
    state.signals.flows.insert(id.clone(), 0.4);
    state.signals.gap_closures.insert(id.clone(), 1.0);
    let updates = update_link_weights(&mut state, &LearningConfig::default());
    assert_eq!(updates.len(), 1);
    let link = state.link(&id).unwrap();
    assert!((link.stats.ema_flow - 0.04).abs() < 1e-12);
    assert!((link.stats.ema_gap_closure - 0.1).abs() < 1e-12);
    assert!(link.log_weight > 0.0);
    assert_eq!(link.stats.update_count, 1);
}

#[test]
fn mechanism_tracks_activation_ema() {
    let now = now_millis();
    let mut state = cohort(3);
    state.begin_cycle(1, now, 1.0);
    state.signals.active_nodes.insert("c1".to_string());
    LearningMechanism::new(LearningConfig::default()).run(&mut state).unwrap();
    assert!((state.node("c1").unwrap().stats.ema_activation - 0.1).abs() < 1e-12);
    assert_eq!(state.node("c0").unwrap().stats.ema_activation, 0.0);
}

proptest! {
    #[test]
    fn raising_the_new_value_never_lowers_cohort_z(
        previous in proptest::collection::vec(0.0f64..5.0, 3..12),
        a in 0.0f64..5.0,
        b in 0.0f64..5.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cohort_z(&previous, 0, low, 3) <= cohort_z(&previous, 0, high, 3));
    }
}
