mod common;

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use common::{every_node_content, rich_entity, rich_link, rich_node, t0};
use substrate_core::errors::{CodecError, SubstrateError};
use substrate_core::traits::GraphBackend;
use substrate_core::{
    GraphState, LinkKind, Node, NodeContent, Predicate, PropertyValue, Record, RecordKind,
};
use substrate_storage::{GraphStore, InMemoryBackend};

fn store() -> (GraphStore, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    (GraphStore::new(backend.clone()), backend)
}

fn concept(id: &str) -> Node {
    rich_node(id, NodeContent::Concept { definition: format!("def {id}") })
}

#[test]
fn put_then_get_returns_the_current_version() {
    let (store, _) = store();
    let node = concept("n1");
    store.put(&Record::Node(node.clone())).unwrap();
    assert_eq!(store.get_node("n1").unwrap(), Some(node));
    assert_eq!(store.get_node("missing").unwrap(), None);
}

#[test]
fn nested_property_map_fails_before_any_backend_call() {
    let (store, backend) = store();
    let map = json!({"name": "x", "meta": {"nested": true}});
    let err = store
        .put_raw(RecordKind::Node, "raw", "concept", map.as_object().unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::CodecError(CodecError::NestedObject { .. })
    ));

    let map = json!({"name": "x", "items": [{"a": 1}]});
    let err = store
        .put_raw(RecordKind::Node, "raw", "concept", map.as_object().unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::CodecError(CodecError::ArrayOfObjects { .. })
    ));
    assert_eq!(backend.call_count(), 0);
}

#[test]
fn flat_raw_map_is_written() {
    let (store, backend) = store();
    let map = json!({"name": "external", "score": 0.5, "tags": ["x", "y"]});
    let vid = store
        .put_raw(RecordKind::Node, "ext", "observation", map.as_object().unwrap())
        .unwrap();
    let hits = store
        .backend()
        .scan(RecordKind::Node, Some("observation"), &Predicate::All)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].vid, vid);
    assert_eq!(backend.version_count(), 1);
}

#[test]
fn supersede_keeps_history_and_links_versions() {
    let (store, _) = store();
    let v1 = concept("n1");
    store.put(&Record::Node(v1.clone())).unwrap();

    let v2 = v1.next_version(
        NodeContent::Concept { definition: "revised".into() },
        t0() + Duration::seconds(5),
    );
    let expired = store.supersede(Record::Node(v2.clone())).unwrap();
    assert_eq!(expired.vid(), v1.vid);

    let history = store.history(RecordKind::Node, "n1").unwrap();
    assert_eq!(history.len(), 2);
    let (old, new) = match (&history[0], &history[1]) {
        (Record::Node(a), Record::Node(b)) => (a, b),
        _ => panic!("expected nodes"),
    };
    assert_eq!(old.vid, v1.vid);
    assert_eq!(old.superseded_by.as_deref(), Some(v2.vid.as_str()));
    assert_eq!(old.temporal.expired_at, Some(v2.temporal.created_at));
    assert_eq!(new.supersedes.as_deref(), Some(v1.vid.as_str()));
    assert!(new.temporal.is_current());

    let current = store.get_node("n1").unwrap().unwrap();
    assert_eq!(current.vid, v2.vid);
    assert!(store.get_version(&v1.vid).unwrap().is_some());
}

#[test]
fn put_with_a_new_version_supersedes() {
    let (store, _) = store();
    let v1 = concept("n1");
    store.put(&Record::Node(v1.clone())).unwrap();
    let v2 = v1.next_version(
        NodeContent::Concept { definition: "again".into() },
        t0() + Duration::seconds(1),
    );
    store.put(&Record::Node(v2)).unwrap();
    assert_eq!(store.history(RecordKind::Node, "n1").unwrap().len(), 2);
}

#[test]
fn query_by_type_applies_predicates() {
    let (store, _) = store();
    for (i, content) in every_node_content().into_iter().enumerate() {
        let mut node = rich_node(&format!("n{i}"), content);
        node.energy = i as f64;
        store.put(&Record::Node(node)).unwrap();
    }
    let hot = store
        .query_by_type(
            RecordKind::Node,
            None,
            &Predicate::gt("energy", PropertyValue::Float(5.5)),
        )
        .unwrap();
    assert_eq!(hot.len(), 3);

    let tasks = store
        .query_by_type(RecordKind::Node, Some("task"), &Predicate::All)
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].type_name(), "task");
}

#[test]
fn vector_query_ranks_by_cosine() {
    let (store, _) = store();
    for (id, v) in [("x", vec![1.0, 0.0, 0.0]), ("y", vec![0.7, 0.7, 0.0]), ("z", vec![0.0, 0.0, 1.0])] {
        let node = concept(id).with_embedding(v);
        store.put(&Record::Node(node)).unwrap();
    }
    let hits = store
        .query_by_vector_similarity(RecordKind::Node, &[1.0, 0.1, 0.0], 2)
        .unwrap();
    let ids: Vec<&str> = hits.iter().map(|(r, _)| r.id()).collect();
    assert_eq!(ids, vec!["x", "y"]);
    assert!(hits[0].1 > hits[1].1);
}

#[test]
fn commit_writes_diff_and_retired_versions() {
    let (store, _) = store();
    let mut before = GraphState::new(t0());
    before.insert_node(concept("a")).unwrap();
    before.insert_node(concept("b")).unwrap();
    before
        .insert_link(rich_link("a", "b", LinkKind::relates_to()))
        .unwrap();
    before.insert_entity(rich_entity("e1")).unwrap();
    let summary = store.commit(&GraphState::new(t0()), &before).unwrap();
    assert_eq!(summary.created, 4);

    let mut after = before.clone();
    after.node_mut("a").unwrap().energy = 9.0;
    after.insert_node(concept("c")).unwrap();
    let link_id = after.links().next().unwrap().id.clone();
    after.expire_link(&link_id, t0() + Duration::seconds(1)).unwrap();

    let summary = store.commit(&before, &after).unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.retired, 1);

    let state = store.load_state(t0() + Duration::seconds(2)).unwrap();
    assert_eq!(state.node_count(), 3);
    assert_eq!(state.link_count(), 0);
    assert_eq!(state.entity_count(), 1);
    assert_eq!(state.node("a").unwrap().energy, 9.0);
}

#[test]
fn invalid_record_in_commit_writes_nothing() {
    let (store, backend) = store();
    let mut after = GraphState::new(t0());
    after.insert_node(concept("good")).unwrap();
    let mut bad = concept("bad");
    bad.energy = f64::INFINITY;
    after.insert_node(bad).unwrap();
    assert!(store.commit(&GraphState::new(t0()), &after).is_err());
    assert_eq!(backend.version_count(), 0);
}
