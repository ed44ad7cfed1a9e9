//! Promotion and dissolution.

use substrate_core::config::LifecycleConfig;
use substrate_core::signals::LifecycleTransition;
use substrate_core::stats::robust_z;
use substrate_core::{GraphState, StabilityState, SubstrateResult};

use crate::quality::entity_quality;

/// How a quality score reads against its cohort this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    High,
    Low,
    Neutral,
}

fn verdict(quality: f64, cohort: &[f64], config: &LifecycleConfig) -> Verdict {
    if cohort.len() < config.min_cohort_size {
        return if quality >= config.fallback_promote_quality {
            Verdict::High
        } else if quality <= config.fallback_dissolve_quality {
            Verdict::Low
        } else {
            Verdict::Neutral
        };
    }
    let z = robust_z(quality, cohort);
    if z >= config.promote_z {
        Verdict::High
    } else if z <= -config.dissolve_z {
        Verdict::Low
    } else {
        Verdict::Neutral
    }
}

/// Age every live entity by one frame, rescore the non-functional ones,
/// and apply any transitions their streaks have earned.
pub fn evaluate_transitions(
    state: &mut GraphState,
    config: &LifecycleConfig,
) -> SubstrateResult<Vec<LifecycleTransition>> {
    let now = state.now;
    for entity in state.entities_mut().filter(|e| !e.is_dissolved()) {
        entity.frames_since_creation += 1;
        if !entity.is_functional() {
            entity.quality_score = entity_quality(&entity.stats, config.quality_floor);
        }
    }

    let cohort: Vec<f64> = state
        .entities()
        .filter(|e| !e.is_functional() && !e.is_dissolved())
        .map(|e| e.quality_score)
        .collect();

    let mut transitions = Vec::new();
    for entity in state
        .entities_mut()
        .filter(|e| !e.is_functional() && !e.is_dissolved())
    {
        match verdict(entity.quality_score, &cohort, config) {
            Verdict::High => {
                entity.high_quality_streak += 1;
                entity.low_quality_streak = 0;
            }
            Verdict::Low => {
                entity.low_quality_streak += 1;
                entity.high_quality_streak = 0;
            }
            Verdict::Neutral => {
                entity.high_quality_streak = 0;
                entity.low_quality_streak = 0;
            }
        }

        let from = entity.stability_state;
        let age = entity.frames_since_creation;
        let to = if entity.low_quality_streak >= config.dissolution_streak
            && age >= config.min_dissolution_age
        {
            Some((StabilityState::Dissolved, "sustained low quality"))
        } else if entity.high_quality_streak >= config.promotion_streak {
            match from {
                StabilityState::Runtime => Some((StabilityState::Provisional, "sustained high quality")),
                StabilityState::Provisional if age >= config.mature_age => {
                    Some((StabilityState::Mature, "sustained high quality at maturity age"))
                }
                _ => None,
            }
        } else {
            None
        };

        let Some((to, reason)) = to else {
            continue;
        };
        if to == StabilityState::Dissolved {
            entity.temporal.invalidate(now)?;
            entity.low_quality_streak = 0;
        } else {
            entity.high_quality_streak = 0;
        }
        entity.stability_state = to;
        transitions.push(LifecycleTransition {
            entity_id: entity.id.clone(),
            from,
            to,
            quality: entity.quality_score,
            age,
            reason: reason.to_string(),
        });
    }
    state.signals.transitions.extend(transitions.iter().cloned());
    Ok(transitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_cohorts_use_quality_bands() {
        let config = LifecycleConfig::default();
        assert_eq!(verdict(0.7, &[0.7, 0.1], &config), Verdict::High);
        assert_eq!(verdict(0.1, &[0.7, 0.1], &config), Verdict::Low);
        assert_eq!(verdict(0.4, &[0.7, 0.4], &config), Verdict::Neutral);
    }
}
