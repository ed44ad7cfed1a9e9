use substrate_core::constants::VECTOR_CENTROID;
use substrate_core::errors::{CodecError, SubstrateResult};
use substrate_core::graph::EntityStats;
use substrate_core::{Entity, EntityKind, RecordKind, Scope, StabilityState, StoredRecord};

use super::fields::{PropReader, PropWriter};

pub(crate) fn encode_entity(entity: &Entity) -> SubstrateResult<StoredRecord> {
    let mut w = PropWriter::new();
    w.text("name", &entity.name);
    w.text("description", &entity.description);
    w.text("kind", entity.kind.as_str());
    w.text("scope", entity.scope.as_str());
    // Membership as two parallel primitive arrays.
    let ids: Vec<String> = entity.members.keys().cloned().collect();
    let weights: Vec<f64> = entity.members.values().copied().collect();
    w.text_array("member_ids", &ids);
    w.float_array("member_weights", &weights);
    w.float("energy", entity.energy);
    w.float("threshold", entity.threshold);
    w.float("log_weight", entity.log_weight);
    w.text("stability_state", entity.stability_state.as_str());
    w.uint("frames_since_creation", entity.frames_since_creation);
    w.float("ema_active", entity.stats.ema_active);
    w.float("ema_coherence", entity.stats.ema_coherence);
    w.float("ema_wm_presence", entity.stats.ema_wm_presence);
    w.float("ema_reinforcement", entity.stats.ema_reinforcement);
    w.float("ema_formation_quality", entity.stats.ema_formation_quality);
    w.float("quality_score", entity.quality_score);
    w.int("high_quality_streak", i64::from(entity.high_quality_streak));
    w.int("low_quality_streak", i64::from(entity.low_quality_streak));
    w.opt_vector(VECTOR_CENTROID, entity.centroid.as_ref());
    w.temporal(&entity.temporal);
    w.opt_text("supersedes", entity.supersedes.as_deref());
    w.opt_text("superseded_by", entity.superseded_by.as_deref());

    Ok(StoredRecord {
        kind: RecordKind::Entity,
        id: entity.id.clone(),
        vid: entity.vid.clone(),
        type_name: entity.kind.as_str().to_string(),
        current: entity.temporal.is_current(),
        source: None,
        target: None,
        properties: w.finish(),
    })
}

pub(crate) fn decode_entity(stored: &StoredRecord) -> SubstrateResult<Entity> {
    let r = PropReader::new(&stored.properties);
    let temporal = r.temporal()?;
    let kind = r.parsed("kind", EntityKind::parse)?;

    let mut entity = Entity::new(stored.id.clone(), r.text("name")?, kind, temporal.created_at);
    entity.vid = stored.vid.clone();
    entity.description = r.text("description")?;
    entity.scope = r.parsed("scope", Scope::parse)?;

    let ids = r.text_array("member_ids")?;
    let weights = r.float_array("member_weights")?;
    if ids.len() != weights.len() {
        return Err(CodecError::TypeMismatch {
            field: "member_weights".to_string(),
            expected: "one weight per member id",
        }
        .into());
    }
    entity.members = ids.into_iter().zip(weights).collect();

    entity.energy = r.float("energy")?;
    entity.threshold = r.float("threshold")?;
    entity.log_weight = r.float("log_weight")?;
    entity.stability_state = r.parsed("stability_state", StabilityState::parse)?;
    entity.frames_since_creation = r.uint("frames_since_creation")?;
    entity.stats = EntityStats {
        ema_active: r.float("ema_active")?,
        ema_coherence: r.float("ema_coherence")?,
        ema_wm_presence: r.float("ema_wm_presence")?,
        ema_reinforcement: r.float("ema_reinforcement")?,
        ema_formation_quality: r.float("ema_formation_quality")?,
    };
    entity.quality_score = r.float("quality_score")?;
    entity.high_quality_streak = u32::try_from(r.uint("high_quality_streak")?).unwrap_or(u32::MAX);
    entity.low_quality_streak = u32::try_from(r.uint("low_quality_streak")?).unwrap_or(u32::MAX);
    entity.centroid = r.opt_vector(VECTOR_CENTROID)?;
    entity.temporal = temporal;
    entity.supersedes = r.opt_text("supersedes")?;
    entity.superseded_by = r.opt_text("superseded_by")?;
    Ok(entity)
}
