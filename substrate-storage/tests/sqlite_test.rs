mod common;

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use common::{every_link_kind, every_node_content, rich_entity, rich_link, rich_node, t0};
use substrate_core::errors::{SafetyError, SubstrateError};
use substrate_core::graph::temporal::truncate_millis;
use substrate_core::traits::{FailureEntry, FailureLog, GraphBackend};
use substrate_core::{NodeContent, Predicate, PropertyValue, Record, RecordKind};
use substrate_storage::{GraphStore, MemoryFailureLog, SqliteBackend};

fn file_backend() -> (tempfile::TempDir, Arc<SqliteBackend>) {
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::open(&dir.path().join("substrate.db"), 1_000).unwrap();
    (dir, Arc::new(backend))
}

#[test]
fn records_round_trip_through_sqlite() {
    let (_dir, backend) = file_backend();
    let store = GraphStore::new(backend);

    let mut expected = Vec::new();
    for (i, content) in every_node_content().into_iter().enumerate() {
        expected.push(Record::Node(rich_node(&format!("n{i}"), content)));
    }
    for kind in every_link_kind() {
        expected.push(Record::Link(rich_link("n0", "n1", kind)));
    }
    expected.push(Record::Entity(rich_entity("e1")));
    store.put_all(&expected).unwrap();

    for record in &expected {
        let read = store.get(record.kind(), record.id()).unwrap();
        assert_eq!(read.as_ref(), Some(record), "{}", record.id());
    }
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("substrate.db");
    let node = rich_node("n1", NodeContent::Concept { definition: "kept".into() });
    {
        let store = GraphStore::new(Arc::new(SqliteBackend::open(&path, 1_000).unwrap()));
        store.put(&Record::Node(node.clone())).unwrap();
    }
    let store = GraphStore::new(Arc::new(SqliteBackend::open(&path, 1_000).unwrap()));
    assert_eq!(store.get_node("n1").unwrap(), Some(node));
}

#[test]
fn history_is_ordered_oldest_first() {
    let (_dir, backend) = file_backend();
    let store = GraphStore::new(backend);
    let v1 = rich_node("n1", NodeContent::Concept { definition: "one".into() });
    store.put(&Record::Node(v1.clone())).unwrap();
    let v2 = v1.next_version(
        NodeContent::Concept { definition: "two".into() },
        t0() + Duration::seconds(1),
    );
    store.supersede(Record::Node(v2.clone())).unwrap();
    let v3 = v2.next_version(
        NodeContent::Concept { definition: "three".into() },
        t0() + Duration::seconds(2),
    );
    store.supersede(Record::Node(v3.clone())).unwrap();

    let vids: Vec<String> = store
        .history(RecordKind::Node, "n1")
        .unwrap()
        .iter()
        .map(|r| r.vid().to_string())
        .collect();
    assert_eq!(vids, vec![v1.vid, v2.vid, v3.vid.clone()]);
    assert_eq!(store.get_node("n1").unwrap().unwrap().vid, v3.vid);
}

#[test]
fn predicates_push_down_and_recheck() {
    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let store = GraphStore::new(backend.clone());
    for i in 0..6 {
        let mut node = rich_node(&format!("n{i}"), NodeContent::Concept { definition: "d".into() });
        node.energy = i as f64;
        if i % 2 == 0 {
            node.description = "even".into();
        }
        store.put(&Record::Node(node)).unwrap();
    }
    let predicate = Predicate::And(vec![
        Predicate::gt("energy", PropertyValue::Int(1)),
        Predicate::Ne("description".into(), PropertyValue::Text("even".into())),
    ]);
    let hits = backend.scan(RecordKind::Node, None, &predicate).unwrap();
    let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["n3", "n5"]);

    let either = Predicate::Or(vec![
        Predicate::eq("energy", PropertyValue::Float(0.0)),
        Predicate::eq("energy", PropertyValue::Float(4.0)),
    ]);
    assert_eq!(backend.scan(RecordKind::Node, None, &either).unwrap().len(), 2);
}

#[test]
fn vector_search_skips_other_dimensions() {
    let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
    let store = GraphStore::new(backend.clone());
    let concept = |id: &str| rich_node(id, NodeContent::Concept { definition: "d".into() });
    store.put(&Record::Node(concept("a").with_embedding(vec![1.0, 0.0]))).unwrap();
    store.put(&Record::Node(concept("b").with_embedding(vec![0.0, 1.0]))).unwrap();
    store.put(&Record::Node(concept("c").with_embedding(vec![1.0, 0.0, 0.0]))).unwrap();
    let hits = backend
        .vector_search(RecordKind::Node, "embedding", &[0.9, 0.1], 5)
        .unwrap();
    let ids: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

fn entry(id: &str) -> FailureEntry {
    FailureEntry {
        id: id.into(),
        cycle: 42,
        created_at: truncate_millis(t0()),
        summary: "energy collapse".into(),
        body: json!({"readings": [{"indicator": "energy_entropy", "value": 0.02}]}),
        acknowledged_at: None,
    }
}

fn exercise_failure_log(log: &dyn FailureLog) {
    log.append(&entry("f1")).unwrap();
    log.append(&entry("f2")).unwrap();
    assert_eq!(log.list().unwrap().len(), 2);
    assert_eq!(log.get("f1").unwrap().unwrap().cycle, 42);
    assert!(log.get("f1").unwrap().unwrap().acknowledged_at.is_none());

    let at = truncate_millis(t0() + Duration::minutes(5));
    log.acknowledge("f1", at).unwrap();
    log.acknowledge("f1", at + Duration::minutes(1)).unwrap();
    assert_eq!(log.get("f1").unwrap().unwrap().acknowledged_at, Some(at));

    let err = log.acknowledge("nope", at).unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::SafetyError(SafetyError::UnknownFailureRecord { .. })
    ));
}

#[test]
fn sqlite_failure_log_is_append_only() {
    let (_dir, backend) = file_backend();
    exercise_failure_log(backend.as_ref());
    assert!(backend.append(&entry("f1")).is_err());
}

#[test]
fn memory_failure_log_matches_sqlite_contract() {
    let log = MemoryFailureLog::new();
    exercise_failure_log(&log);
    assert!(log.append(&entry("f1")).is_err());
}
