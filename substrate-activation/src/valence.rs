//! Entity-scale guidance for strides.
//!
//! When a source has outgoing links into several entities, each candidate
//! entity is scored on five terms. Every term is rank-normalised within the
//! candidate set (raw when the set is small) and the terms are summed.

use std::collections::{BTreeMap, BTreeSet};

use substrate_core::stats::{cosine_similarity, rank_z_scores};
use substrate_core::{Entity, GraphState, Link};

/// Raw valence terms for one candidate entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValenceTerms {
    pub goal_alignment: f64,
    pub novelty: f64,
    pub completeness: f64,
    pub complementarity: f64,
    pub ease: f64,
}

impl ValenceTerms {
    fn as_array(&self) -> [f64; 5] {
        [
            self.goal_alignment,
            self.novelty,
            self.completeness,
            self.complementarity,
            self.ease,
        ]
    }
}

/// What the current cycle looks like from the entity scale.
pub struct ValenceContext<'a> {
    pub goal: Option<&'a [f32]>,
    pub active: &'a BTreeSet<String>,
    /// Mean embedding of the active set.
    pub active_centroid: Option<Vec<f32>>,
}

/// Mean of the embeddings of `ids` that have one of the common length.
pub fn mean_embedding(state: &GraphState, ids: &BTreeSet<String>) -> Option<Vec<f32>> {
    let vectors: Vec<&Vec<f32>> = ids
        .iter()
        .filter_map(|id| state.node(id)?.embedding.as_ref())
        .collect();
    let dim = vectors.first()?.len();
    let same: Vec<&Vec<f32>> = vectors.into_iter().filter(|v| v.len() == dim).collect();
    let mut sum = vec![0.0f32; dim];
    for v in &same {
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let n = same.len() as f32;
    Some(sum.into_iter().map(|x| x / n).collect())
}

pub fn valence_terms(
    entity: &Entity,
    candidate_links: &[&Link],
    ctx: &ValenceContext<'_>,
) -> ValenceTerms {
    let goal_alignment = match (ctx.goal, entity.centroid.as_deref()) {
        (Some(goal), Some(c)) => (cosine_similarity(goal, c) + 1.0) / 2.0,
        _ => 0.5,
    };
    let novelty = (1.0 - entity.stats.ema_active).clamp(0.0, 1.0);
    let completeness = match (ctx.active_centroid.as_deref(), entity.centroid.as_deref()) {
        (Some(a), Some(c)) => 1.0 - cosine_similarity(a, c),
        _ => 0.5,
    };
    let complementarity = if entity.members.is_empty() {
        1.0
    } else {
        let overlap = entity
            .members
            .keys()
            .filter(|id| ctx.active.contains(*id))
            .count();
        1.0 - overlap as f64 / entity.members.len() as f64
    };
    let max_weight = candidate_links
        .iter()
        .map(|l| l.weight())
        .fold(0.0f64, f64::max);
    let into_entity = candidate_links
        .iter()
        .filter(|l| entity.members.contains_key(&l.target))
        .map(|l| l.weight())
        .fold(0.0f64, f64::max);
    let ease = if max_weight > 0.0 {
        into_entity / max_weight
    } else {
        0.0
    };
    ValenceTerms {
        goal_alignment,
        novelty,
        completeness,
        complementarity,
        ease,
    }
}

/// Pick the entity to aim at. `None` when no candidate target belongs to
/// any live entity. Ties go to the smaller entity id.
pub fn choose_entity<'s>(
    state: &'s GraphState,
    candidate_links: &[&'s Link],
    ctx: &ValenceContext<'_>,
    min_cohort_size: usize,
) -> Option<&'s Entity> {
    let mut candidates: BTreeMap<&str, &'s Entity> = BTreeMap::new();
    for link in candidate_links {
        for entity in state.entities_containing(&link.target) {
            candidates.insert(entity.id.as_str(), entity);
        }
    }
    if candidates.is_empty() {
        return None;
    }

    let entities: Vec<&'s Entity> = candidates.into_values().collect();
    let terms: Vec<[f64; 5]> = entities
        .iter()
        .map(|e| valence_terms(e, candidate_links, ctx).as_array())
        .collect();
    let mut scores = vec![0.0; entities.len()];
    for t in 0..5 {
        let column: Vec<f64> = terms.iter().map(|row| row[t]).collect();
        let normalised = if column.len() < min_cohort_size {
            column
        } else {
            rank_z_scores(&column)
        };
        for (score, v) in scores.iter_mut().zip(normalised) {
            *score += v;
        }
    }

    // entities are in id order, so the first maximum wins ties
    let mut best = 0;
    for i in 1..scores.len() {
        if scores[i] > scores[best] {
            best = i;
        }
    }
    entities.get(best).copied()
}
