use std::collections::BTreeMap;

use substrate_core::constants::{BLOB_ATTRIBUTES, BLOB_ENTITY_EMOTIONS, BLOB_WEIGHT_OVERLAYS};
use substrate_core::errors::{CodecError, SubstrateResult};
use substrate_core::graph::LinkStats;
use substrate_core::{
    Confidence, FormationTrigger, Link, LinkKind, RecordKind, Scope, StoredRecord,
};

use super::fields::{PropReader, PropWriter};

pub(crate) fn encode_link(link: &Link) -> SubstrateResult<StoredRecord> {
    let mut w = PropWriter::new();
    w.text("source", &link.source);
    w.text("target", &link.target);
    w.text("scope", link.scope.as_str());
    w.text("goal", &link.goal);
    w.text("mindstate", &link.mindstate);
    w.float("confidence", link.confidence.value());
    w.text("formation_trigger", link.formation_trigger.as_str());
    w.text("created_by", &link.created_by);
    w.text("substrate_origin", &link.substrate_origin);
    w.temporal(&link.temporal);
    w.opt_text("supersedes", link.supersedes.as_deref());
    w.opt_text("superseded_by", link.superseded_by.as_deref());
    w.float("energy", link.energy());
    w.float("log_weight", link.log_weight);
    w.float("ema_reinforcement", link.stats.ema_reinforcement);
    w.float("ema_formation_quality", link.stats.ema_formation_quality);
    w.float("ema_gap_closure", link.stats.ema_gap_closure);
    w.float("ema_flow", link.stats.ema_flow);
    w.float("ema_update_interval", link.stats.ema_update_interval);
    w.uint("update_count", link.stats.update_count);
    w.float("precedence_forward", link.precedence_forward);
    w.float("precedence_backward", link.precedence_backward);
    w.float("last_flow", link.last_flow);
    w.float("flow_total", link.flow_total);
    w.opt_time("last_update_timestamp", link.last_update_timestamp);
    w.blob(BLOB_ENTITY_EMOTIONS, &link.entity_emotions)?;
    w.blob(BLOB_WEIGHT_OVERLAYS, &link.log_weight_overlays)?;
    encode_kind(&mut w, &link.kind)?;

    Ok(StoredRecord {
        kind: RecordKind::Link,
        id: link.id.clone(),
        vid: link.vid.clone(),
        type_name: link.type_name().to_string(),
        current: link.temporal.is_current(),
        source: Some(link.source.clone()),
        target: Some(link.target.clone()),
        properties: w.finish(),
    })
}

fn encode_kind(w: &mut PropWriter, kind: &LinkKind) -> Result<(), CodecError> {
    match kind {
        LinkKind::Enables {
            enabling_type,
            degree_of_necessity,
        } => {
            w.text("enabling_type", enabling_type);
            w.text("degree_of_necessity", degree_of_necessity);
        }
        LinkKind::Blocks {
            blocking_condition,
            severity,
        } => {
            w.text("blocking_condition", blocking_condition);
            w.float("severity", *severity);
        }
        LinkKind::RelatesTo {
            relationship_strength,
        } => w.text("relationship_strength", relationship_strength),
        LinkKind::Requires {
            requirement_criticality,
        } => w.text("requirement_criticality", requirement_criticality),
        LinkKind::Suppresses {
            suppression_mechanism,
        } => w.text("suppression_mechanism", suppression_mechanism),
        LinkKind::JustifiedBy {
            justification_type,
            justification_strength,
        } => {
            w.text("justification_type", justification_type);
            w.text("justification_strength", justification_strength);
        }
        LinkKind::Generic {
            type_name,
            attributes,
        } => {
            if LinkKind::BUILTIN_TYPES.contains(&type_name.as_str()) {
                return Err(CodecError::ReservedTypeName {
                    kind: "link".to_string(),
                    type_name: type_name.clone(),
                });
            }
            w.blob(BLOB_ATTRIBUTES, attributes)?;
        }
    }
    Ok(())
}

fn decode_kind(type_name: &str, r: &PropReader<'_>) -> Result<LinkKind, CodecError> {
    let kind = match type_name {
        "enables" => LinkKind::Enables {
            enabling_type: r.text("enabling_type")?,
            degree_of_necessity: r.text("degree_of_necessity")?,
        },
        "blocks" => LinkKind::Blocks {
            blocking_condition: r.text("blocking_condition")?,
            severity: r.float("severity")?,
        },
        "relates_to" => LinkKind::RelatesTo {
            relationship_strength: r.text("relationship_strength")?,
        },
        "requires" => LinkKind::Requires {
            requirement_criticality: r.text("requirement_criticality")?,
        },
        "suppresses" => LinkKind::Suppresses {
            suppression_mechanism: r.text("suppression_mechanism")?,
        },
        "justified_by" => LinkKind::JustifiedBy {
            justification_type: r.text("justification_type")?,
            justification_strength: r.text("justification_strength")?,
        },
        other => LinkKind::Generic {
            type_name: other.to_string(),
            attributes: r.blob::<BTreeMap<String, serde_json::Value>>(BLOB_ATTRIBUTES)?,
        },
    };
    Ok(kind)
}

pub(crate) fn decode_link(stored: &StoredRecord) -> SubstrateResult<Link> {
    let r = PropReader::new(&stored.properties);
    let kind = decode_kind(&stored.type_name, &r)?;
    let temporal = r.temporal()?;

    let mut link = Link::new(
        r.text("source")?,
        r.text("target")?,
        kind,
        r.float("energy")?,
        temporal.created_at,
    );
    link.id = stored.id.clone();
    link.vid = stored.vid.clone();
    link.scope = r.parsed("scope", Scope::parse)?;
    link.goal = r.text("goal")?;
    link.mindstate = r.text("mindstate")?;
    link.confidence = Confidence::new(r.float("confidence")?);
    link.formation_trigger = r.parsed("formation_trigger", FormationTrigger::parse)?;
    link.created_by = r.text("created_by")?;
    link.substrate_origin = r.text("substrate_origin")?;
    link.temporal = temporal;
    link.supersedes = r.opt_text("supersedes")?;
    link.superseded_by = r.opt_text("superseded_by")?;
    link.log_weight = r.float("log_weight")?;
    link.stats = LinkStats {
        ema_reinforcement: r.float("ema_reinforcement")?,
        ema_formation_quality: r.float("ema_formation_quality")?,
        ema_gap_closure: r.float("ema_gap_closure")?,
        ema_flow: r.float("ema_flow")?,
        ema_update_interval: r.float("ema_update_interval")?,
        update_count: r.uint("update_count")?,
    };
    link.precedence_forward = r.float("precedence_forward")?;
    link.precedence_backward = r.float("precedence_backward")?;
    link.last_flow = r.float("last_flow")?;
    link.flow_total = r.float("flow_total")?;
    link.last_update_timestamp = r.opt_time("last_update_timestamp")?;
    link.entity_emotions =
        r.blob::<BTreeMap<String, BTreeMap<String, f64>>>(BLOB_ENTITY_EMOTIONS)?;
    link.log_weight_overlays = r.blob::<BTreeMap<String, f64>>(BLOB_WEIGHT_OVERLAYS)?;
    Ok(link)
}
