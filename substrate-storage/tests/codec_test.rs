mod common;

use proptest::prelude::*;

use common::{every_link_kind, every_node_content, rich_entity, rich_link, rich_node};
use substrate_core::errors::{CodecError, SubstrateError};
use substrate_core::{LinkKind, NodeContent, PropertyValue, Record, RecordKind};
use substrate_storage::{decode, encode};

#[test]
fn every_node_type_round_trips() {
    for (i, content) in every_node_content().into_iter().enumerate() {
        let node = rich_node(&format!("n{i}"), content);
        let record = Record::Node(node);
        let stored = encode(&record).unwrap();
        assert_eq!(stored.kind, RecordKind::Node);
        assert_eq!(decode(&stored).unwrap(), record, "type {}", record.type_name());
    }
}

#[test]
fn every_link_type_round_trips() {
    for kind in every_link_kind() {
        let record = Record::Link(rich_link("a", "b", kind));
        let stored = encode(&record).unwrap();
        assert_eq!(stored.source.as_deref(), Some("a"));
        assert_eq!(stored.target.as_deref(), Some("b"));
        assert_eq!(decode(&stored).unwrap(), record, "type {}", record.type_name());
    }
}

#[test]
fn entity_round_trips_with_parallel_member_arrays() {
    let record = Record::Entity(rich_entity("e1"));
    let stored = encode(&record).unwrap();
    assert_eq!(
        stored.properties.get("member_ids"),
        Some(&PropertyValue::TextArray(vec!["n0".into(), "n1".into()]))
    );
    assert_eq!(
        stored.properties.get("member_weights"),
        Some(&PropertyValue::FloatArray(vec![0.9, 0.4]))
    );
    assert_eq!(decode(&stored).unwrap(), record);
}

#[test]
fn storage_classes_are_flat() {
    let node = rich_node("n", NodeContent::Concept { definition: "d".into() });
    let stored = encode(&Record::Node(node)).unwrap();
    let props = &stored.properties;
    assert!(matches!(props.get("created_at"), Some(PropertyValue::Int(_))));
    assert!(matches!(props.get("scope"), Some(PropertyValue::Text(s)) if s == "organizational"));
    assert!(matches!(props.get("entity_activations"), Some(PropertyValue::Text(_))));
    assert!(matches!(props.get("embedding"), Some(PropertyValue::Vector(v)) if v.len() == 3));
}

#[test]
fn weight_overlays_travel_as_a_text_blob() {
    let mut node = rich_node("n", NodeContent::Concept { definition: "d".into() });
    node.log_weight_overlays.insert("e1".into(), 0.75);
    node.log_weight_overlays.insert("e2".into(), -0.5);
    let record = Record::Node(node);
    let stored = encode(&record).unwrap();
    let Some(PropertyValue::Text(blob)) = stored.properties.get("log_weight_overlays") else {
        panic!("overlays should be a text blob");
    };
    let parsed: serde_json::Value = serde_json::from_str(blob).unwrap();
    assert_eq!(parsed["e1"], 0.75);
    assert_eq!(decode(&stored).unwrap(), record);
}

#[test]
fn timestamps_are_truncated_to_milliseconds() {
    let node = rich_node("n", NodeContent::Concept { definition: "d".into() });
    assert_eq!(node.temporal.created_at.timestamp_subsec_nanos() % 1_000_000, 0);
    let decoded = decode(&encode(&Record::Node(node.clone())).unwrap()).unwrap();
    assert_eq!(decoded.temporal().created_at, node.temporal.created_at);
}

#[test]
fn generic_type_with_builtin_name_is_rejected() {
    let node = rich_node(
        "n",
        NodeContent::Generic {
            type_name: "concept".into(),
            attributes: Default::default(),
        },
    );
    let err = encode(&Record::Node(node)).unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::CodecError(CodecError::ReservedTypeName { .. })
    ));

    let link = rich_link(
        "a",
        "b",
        LinkKind::Generic {
            type_name: "blocks".into(),
            attributes: Default::default(),
        },
    );
    assert!(encode(&Record::Link(link)).is_err());
}

#[test]
fn non_finite_dynamics_are_rejected() {
    let mut node = rich_node("n", NodeContent::Concept { definition: "d".into() });
    node.log_weight = f64::NAN;
    let err = encode(&Record::Node(node)).unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::CodecError(CodecError::NonFiniteFloat { ref field }) if field == "log_weight"
    ));
}

#[test]
fn missing_field_is_reported_on_decode() {
    let node = rich_node("n", NodeContent::Concept { definition: "d".into() });
    let mut stored = encode(&Record::Node(node)).unwrap();
    stored.properties.remove("definition");
    let err = decode(&stored).unwrap_err();
    assert!(matches!(
        err,
        SubstrateError::CodecError(CodecError::MissingField { ref field }) if field == "definition"
    ));
}

proptest! {
    #[test]
    fn arbitrary_dynamics_survive_the_codec(
        energy in 0.0f64..1e6,
        log_weight in -50.0f64..50.0,
        embedding in proptest::collection::vec(-1.0f32..1.0, 0..16),
    ) {
        let mut node = rich_node("p", NodeContent::Concept { definition: "d".into() });
        node.energy = energy;
        node.log_weight = log_weight;
        node.embedding = if embedding.is_empty() { None } else { Some(embedding) };
        let record = Record::Node(node);
        prop_assert_eq!(decode(&encode(&record).unwrap()).unwrap(), record);
    }
}
