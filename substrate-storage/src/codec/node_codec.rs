use std::collections::BTreeMap;

use substrate_core::constants::{
    BLOB_ATTRIBUTES, BLOB_ENTITY_ACTIVATIONS, BLOB_WEIGHT_OVERLAYS, VECTOR_EMBEDDING,
};
use substrate_core::errors::{CodecError, SubstrateResult};
use substrate_core::graph::{EntityActivation, NodeStats};
use substrate_core::{
    Confidence, FormationTrigger, Node, NodeContent, PropertyMap, RecordKind, Scope, StoredRecord,
};

use super::fields::{PropReader, PropWriter};

pub(crate) fn encode_node(node: &Node) -> SubstrateResult<StoredRecord> {
    let mut w = PropWriter::new();
    w.text("name", &node.name);
    w.text("description", &node.description);
    w.text("scope", node.scope.as_str());
    w.float("confidence", node.confidence.value());
    w.text("formation_trigger", node.formation_trigger.as_str());
    w.text("created_by", &node.created_by);
    w.text("substrate_origin", &node.substrate_origin);
    w.temporal(&node.temporal);
    w.opt_text("supersedes", node.supersedes.as_deref());
    w.opt_text("superseded_by", node.superseded_by.as_deref());
    w.float("energy", node.energy);
    w.float("threshold", node.threshold);
    w.float("log_weight", node.log_weight);
    w.float("ema_reinforcement", node.stats.ema_reinforcement);
    w.float("ema_wm_presence", node.stats.ema_wm_presence);
    w.float("ema_formation_quality", node.stats.ema_formation_quality);
    w.float("ema_activation", node.stats.ema_activation);
    w.float("ema_update_interval", node.stats.ema_update_interval);
    w.uint("update_count", node.stats.update_count);
    w.opt_time("last_update_timestamp", node.last_update_timestamp);
    w.blob(BLOB_ENTITY_ACTIVATIONS, &node.entity_activations)?;
    w.blob(BLOB_WEIGHT_OVERLAYS, &node.log_weight_overlays)?;
    w.opt_vector(VECTOR_EMBEDDING, node.embedding.as_ref());
    w.text("content_hash", &node.content_hash);
    encode_content(&mut w, &node.content)?;

    Ok(StoredRecord {
        kind: RecordKind::Node,
        id: node.id.clone(),
        vid: node.vid.clone(),
        type_name: node.type_name().to_string(),
        current: node.temporal.is_current(),
        source: None,
        target: None,
        properties: w.finish(),
    })
}

fn encode_content(w: &mut PropWriter, content: &NodeContent) -> Result<(), CodecError> {
    match content {
        NodeContent::Memory {
            occurred_at,
            participants,
        } => {
            w.time("occurred_at", *occurred_at);
            w.text_array("participants", participants);
        }
        NodeContent::Concept { definition } => w.text("definition", definition),
        NodeContent::Principle {
            principle_statement,
            why_it_matters,
        } => {
            w.text("principle_statement", principle_statement);
            w.text("why_it_matters", why_it_matters);
        }
        NodeContent::Realization {
            what_i_realized,
            context_when_discovered,
        } => {
            w.text("what_i_realized", what_i_realized);
            w.text("context_when_discovered", context_when_discovered);
        }
        NodeContent::Task {
            priority,
            estimated_hours,
            steps,
        } => {
            w.text("priority", priority);
            w.float("estimated_hours", *estimated_hours);
            w.text_array("steps", steps);
        }
        NodeContent::Goal {
            goal_description,
            target_date,
        } => {
            w.text("goal_description", goal_description);
            w.opt_time("target_date", *target_date);
        }
        NodeContent::Person {
            role,
            relationship_type,
        } => {
            w.text("role", role);
            w.text("relationship_type", relationship_type);
        }
        NodeContent::Mechanism {
            how_it_works,
            inputs,
            outputs,
        } => {
            w.text("how_it_works", how_it_works);
            w.text_array("inputs", inputs);
            w.text_array("outputs", outputs);
        }
        NodeContent::Generic {
            type_name,
            attributes,
        } => {
            if NodeContent::BUILTIN_TYPES.contains(&type_name.as_str()) {
                return Err(CodecError::ReservedTypeName {
                    kind: "node".to_string(),
                    type_name: type_name.clone(),
                });
            }
            w.blob(BLOB_ATTRIBUTES, attributes)?;
        }
    }
    Ok(())
}

fn decode_content(type_name: &str, r: &PropReader<'_>) -> Result<NodeContent, CodecError> {
    let content = match type_name {
        "memory" => NodeContent::Memory {
            occurred_at: r.time("occurred_at")?,
            participants: r.text_array("participants")?,
        },
        "concept" => NodeContent::Concept {
            definition: r.text("definition")?,
        },
        "principle" => NodeContent::Principle {
            principle_statement: r.text("principle_statement")?,
            why_it_matters: r.text("why_it_matters")?,
        },
        "realization" => NodeContent::Realization {
            what_i_realized: r.text("what_i_realized")?,
            context_when_discovered: r.text("context_when_discovered")?,
        },
        "task" => NodeContent::Task {
            priority: r.text("priority")?,
            estimated_hours: r.float("estimated_hours")?,
            steps: r.text_array("steps")?,
        },
        "goal" => NodeContent::Goal {
            goal_description: r.text("goal_description")?,
            target_date: r.opt_time("target_date")?,
        },
        "person" => NodeContent::Person {
            role: r.text("role")?,
            relationship_type: r.text("relationship_type")?,
        },
        "mechanism" => NodeContent::Mechanism {
            how_it_works: r.text("how_it_works")?,
            inputs: r.text_array("inputs")?,
            outputs: r.text_array("outputs")?,
        },
        other => NodeContent::Generic {
            type_name: other.to_string(),
            attributes: r.blob::<BTreeMap<String, serde_json::Value>>(BLOB_ATTRIBUTES)?,
        },
    };
    Ok(content)
}

pub(crate) fn decode_node(stored: &StoredRecord) -> SubstrateResult<Node> {
    let props: &PropertyMap = &stored.properties;
    let r = PropReader::new(props);
    let content = decode_content(&stored.type_name, &r)?;
    let temporal = r.temporal()?;

    let mut node = Node::new(stored.id.clone(), r.text("name")?, content, temporal.created_at);
    node.vid = stored.vid.clone();
    node.description = r.text("description")?;
    node.scope = r.parsed("scope", Scope::parse)?;
    node.confidence = Confidence::new(r.float("confidence")?);
    node.formation_trigger = r.parsed("formation_trigger", FormationTrigger::parse)?;
    node.created_by = r.text("created_by")?;
    node.substrate_origin = r.text("substrate_origin")?;
    node.temporal = temporal;
    node.supersedes = r.opt_text("supersedes")?;
    node.superseded_by = r.opt_text("superseded_by")?;
    node.energy = r.float("energy")?;
    node.threshold = r.float("threshold")?;
    node.log_weight = r.float("log_weight")?;
    node.stats = NodeStats {
        ema_reinforcement: r.float("ema_reinforcement")?,
        ema_wm_presence: r.float("ema_wm_presence")?,
        ema_formation_quality: r.float("ema_formation_quality")?,
        ema_activation: r.float("ema_activation")?,
        ema_update_interval: r.float("ema_update_interval")?,
        update_count: r.uint("update_count")?,
    };
    node.last_update_timestamp = r.opt_time("last_update_timestamp")?;
    node.entity_activations =
        r.blob::<BTreeMap<String, EntityActivation>>(BLOB_ENTITY_ACTIVATIONS)?;
    node.log_weight_overlays = r.blob::<BTreeMap<String, f64>>(BLOB_WEIGHT_OVERLAYS)?;
    node.embedding = r.opt_vector(VECTOR_EMBEDDING)?;
    node.content_hash = r.text("content_hash")?;
    Ok(node)
}
