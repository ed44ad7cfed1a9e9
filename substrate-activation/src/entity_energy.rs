//! Entity energy from member surplus, cohort thresholds, and flips.

use std::collections::BTreeMap;

use substrate_core::config::ActivationConfig;
use substrate_core::graph::EntityActivation;
use substrate_core::signals::EntityFlip;
use substrate_core::stats::robust_threshold;
use substrate_core::{EntityKind, GraphState, Scope};

/// Recompute energy, threshold, and active state for every live entity.
///
/// Energy is `Σ m · log1p(max(0, E − Θ))` over members. Thresholds are
/// `median + k·MAD` within the (kind, scope) cohort. Members of active
/// entities get their per-entity activation stamped. Returns the flips.
pub fn aggregate_entities(state: &mut GraphState, config: &ActivationConfig) -> Vec<EntityFlip> {
    let cycle = state.cycle;

    // (entity id, energy, per-member contributions)
    let mut computed: Vec<(String, f64, Vec<(String, f64)>)> = Vec::new();
    for entity in state.entities().filter(|e| !e.is_dissolved()) {
        let mut total = 0.0;
        let mut parts = Vec::new();
        for (member, m) in &entity.members {
            if let Some(node) = state.node(member) {
                let c = m * node.surplus().ln_1p();
                total += c;
                parts.push((member.clone(), c));
            }
        }
        computed.push((entity.id.clone(), total, parts));
    }

    let mut cohorts: BTreeMap<(EntityKind, Scope), Vec<f64>> = BTreeMap::new();
    for (id, energy, _) in &computed {
        if let Some(e) = state.entity(id) {
            cohorts.entry((e.kind, e.scope)).or_default().push(*energy);
        }
    }
    let thresholds: BTreeMap<(EntityKind, Scope), f64> = cohorts
        .into_iter()
        .map(|(key, energies)| {
            let t = robust_threshold(
                &energies,
                config.entity_threshold_mad_k,
                config.entity_threshold_floor,
            );
            (key, t)
        })
        .collect();

    let mut flips = Vec::new();
    for (id, energy, parts) in computed {
        let Some(entity) = state.entity_mut(&id) else {
            continue;
        };
        let was_active = entity.is_active();
        entity.energy = energy;
        entity.threshold = thresholds
            .get(&(entity.kind, entity.scope))
            .copied()
            .unwrap_or(config.entity_threshold_floor);
        let now_active = entity.is_active();
        if was_active != now_active {
            flips.push(EntityFlip {
                entity_id: id.clone(),
                became_active: now_active,
                energy: entity.energy,
                threshold: entity.threshold,
            });
        }
        if now_active {
            state.signals.active_entities.insert(id.clone());
            for (member, contribution) in parts {
                if let Some(node) = state.node_mut(&member) {
                    node.entity_activations.insert(
                        id.clone(),
                        EntityActivation {
                            energy: contribution,
                            last_activated_cycle: cycle,
                        },
                    );
                }
            }
        }
    }
    update_centroids(state);
    flips
}

/// Membership-weighted mean of member embeddings.
fn update_centroids(state: &mut GraphState) {
    let mut centroids: Vec<(String, Vec<f32>)> = Vec::new();
    for entity in state.entities().filter(|e| !e.is_dissolved()) {
        let mut sum: Option<Vec<f32>> = None;
        let mut total = 0.0f32;
        for (member, m) in &entity.members {
            let Some(embedding) = state.node(member).and_then(|n| n.embedding.as_ref()) else {
                continue;
            };
            let w = *m as f32;
            let acc = sum.get_or_insert_with(|| vec![0.0; embedding.len()]);
            if acc.len() != embedding.len() {
                continue;
            }
            for (a, x) in acc.iter_mut().zip(embedding) {
                *a += w * x;
            }
            total += w;
        }
        if let Some(acc) = sum {
            if total > 0.0 {
                centroids.push((entity.id.clone(), acc.into_iter().map(|x| x / total).collect()));
            }
        }
    }
    for (id, centroid) in centroids {
        if let Some(entity) = state.entity_mut(&id) {
            entity.centroid = Some(centroid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::graph::temporal::now_millis;
    use substrate_core::{Entity, Node, NodeContent};

    #[test]
    fn entity_energy_uses_member_surplus() {
        let now = now_millis();
        let mut state = GraphState::new(now);
        for (id, energy) in [("a", 2.0), ("b", 0.5)] {
            let mut n = Node::new(id, id, NodeContent::Concept { definition: String::new() }, now)
                .with_energy(energy)
                .with_embedding(vec![1.0, 0.0]);
            n.threshold = 1.0;
            state.insert_node(n).unwrap();
        }
        let entity = Entity::new("e", "e", EntityKind::Emergent, now)
            .with_member("a", 1.0)
            .with_member("b", 0.5);
        state.insert_entity(entity).unwrap();

        let flips = aggregate_entities(&mut state, &ActivationConfig::default());
        let e = state.entity("e").unwrap();
        assert!((e.energy - 1.0f64.ln_1p()).abs() < 1e-12);
        assert!(e.is_active());
        assert_eq!(flips.len(), 1);
        assert!(flips[0].became_active);
        assert_eq!(state.node("a").unwrap().entity_activations["e"].last_activated_cycle, 0);
        assert_eq!(e.centroid.as_deref(), Some(&[1.0f32, 0.0][..]));
    }
}
