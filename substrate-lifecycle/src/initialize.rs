use substrate_core::config::LifecycleConfig;
use substrate_core::graph::EntityStats;
use substrate_core::{Entity, GraphState, SubstrateResult};

use crate::quality::entity_quality;

/// Starting statistics for a new entity. Functional entities begin at the
/// neutral EMA so they never look like outliers; the rest start at zero.
pub fn initialize_entity(entity: &mut Entity, config: &LifecycleConfig) {
    entity.stats = if entity.is_functional() {
        EntityStats::uniform(config.functional_neutral_ema)
    } else {
        EntityStats::default()
    };
    entity.quality_score = entity_quality(&entity.stats, config.quality_floor);
    entity.high_quality_streak = 0;
    entity.low_quality_streak = 0;
    entity.frames_since_creation = 0;
}

/// Initialise and insert.
pub fn register_entity(
    state: &mut GraphState,
    mut entity: Entity,
    config: &LifecycleConfig,
) -> SubstrateResult<()> {
    initialize_entity(&mut entity, config);
    state.insert_entity(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::EntityKind;

    #[test]
    fn functional_entities_start_neutral() {
        let mut e = Entity::new("f", "f", EntityKind::Functional, now_millis());
        initialize_entity(&mut e, &LifecycleConfig::default());
        assert_eq!(e.stats, EntityStats::uniform(0.5));
        assert!((e.quality_score - 0.5).abs() < 1e-12);

        let mut e = Entity::new("e", "e", EntityKind::Emergent, now_millis());
        initialize_entity(&mut e, &LifecycleConfig::default());
        assert_eq!(e.stats, EntityStats::default());
    }
}
