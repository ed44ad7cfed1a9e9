use chrono::Duration;

use substrate_core::errors::{SubstrateError, TemporalError};
use substrate_core::graph::temporal::now_millis;
use substrate_core::{Entity, EntityKind, GraphState, Link, LinkKind, Node, NodeContent, Record};

fn concept(id: &str) -> NodeContent {
    NodeContent::Concept {
        definition: format!("definition of {id}"),
    }
}

fn small_graph() -> GraphState {
    let now = now_millis();
    let mut state = GraphState::new(now);
    for id in ["a", "b", "c"] {
        state.insert_node(Node::new(id, id, concept(id), now)).unwrap();
    }
    state
        .insert_link(Link::new("a", "b", LinkKind::relates_to(), 0.4, now))
        .unwrap();
    state
        .insert_link(Link::new("b", "c", LinkKind::relates_to(), 0.4, now))
        .unwrap();
    state
}

#[test]
fn adjacency_follows_live_links() {
    let state = small_graph();
    assert_eq!(state.outgoing_links("a").count(), 1);
    assert_eq!(state.incoming_links("c").count(), 1);
    assert_eq!(state.degree("b"), 2);
}

#[test]
fn link_to_missing_node_is_rejected() {
    let mut state = small_graph();
    let now = state.now;
    let err = state
        .insert_link(Link::new("a", "ghost", LinkKind::relates_to(), 0.1, now))
        .unwrap_err();
    assert!(matches!(err, SubstrateError::NotFound { .. }));
}

#[test]
fn supersede_keeps_one_current_version_and_links_history() {
    let mut state = small_graph();
    let later = state.now + Duration::seconds(5);
    let old_vid = state.node("a").unwrap().vid.clone();
    let next = state.node("a").unwrap().next_version(
        NodeContent::Concept {
            definition: "refined".into(),
        },
        later,
    );
    let new_vid = next.vid.clone();
    state.supersede_node(next).unwrap();

    assert_eq!(state.node_count(), 3);
    let current = state.node("a").unwrap();
    assert_eq!(current.supersedes.as_deref(), Some(old_vid.as_str()));

    let retired = state.retired();
    assert_eq!(retired.len(), 1);
    match &retired[0] {
        Record::Node(old) => {
            assert_eq!(old.vid, old_vid);
            assert_eq!(old.superseded_by.as_deref(), Some(new_vid.as_str()));
            assert_eq!(old.temporal.expired_at, Some(later));
        }
        other => panic!("unexpected retired record {other:?}"),
    }
}

#[test]
fn expiring_a_link_removes_it_from_adjacency() {
    let mut state = small_graph();
    let at = state.now;
    state.expire_link("a->b:relates_to", at).unwrap();
    assert_eq!(state.outgoing_links("a").count(), 0);
    assert_eq!(state.link_count(), 1);
    assert_eq!(state.retired().len(), 1);
}

#[test]
fn invalidated_link_stays_current_but_not_live() {
    let mut state = small_graph();
    let at = state.now;
    state.invalidate_link("b->c:relates_to", at).unwrap();
    assert_eq!(state.link_count(), 2);
    assert_eq!(state.outgoing_links("b").count(), 0);
    let err = state.invalidate_link("b->c:relates_to", at).unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::TemporalError(TemporalError::AlreadySet { .. })
    ));
}

#[test]
fn link_affect_is_clamped_and_independent_of_flow() {
    let now = now_millis();
    let mut link = Link::new("a", "b", LinkKind::relates_to(), 3.0, now);
    assert_eq!(link.energy(), 1.0);
    link.record_flow(0.7);
    assert_eq!(link.energy(), 1.0);
    assert_eq!(link.last_flow, 0.7);
    assert_eq!(link.source_share(), 0.5);
}

#[test]
fn entities_containing_skips_dissolved() {
    let mut state = small_graph();
    let now = state.now;
    let e = Entity::new("e1", "cluster", EntityKind::Emergent, now).with_member("a", 0.9);
    state.insert_entity(e).unwrap();
    assert_eq!(state.entities_containing("a").count(), 1);
    state.entity_mut("e1").unwrap().stability_state =
        substrate_core::StabilityState::Dissolved;
    assert_eq!(state.entities_containing("a").count(), 0);
}
