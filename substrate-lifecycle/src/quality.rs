use substrate_core::graph::EntityStats;
use substrate_core::stats::geometric_mean;

/// Geometric mean of the five entity EMAs, each floored at `floor`.
pub fn entity_quality(stats: &EntityStats, floor: f64) -> f64 {
    geometric_mean(&stats.as_array(), floor).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_stats_score_neutral() {
        assert!((entity_quality(&EntityStats::uniform(0.5), 0.01) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn one_dead_signal_drags_quality_down() {
        let mut stats = EntityStats::uniform(1.0);
        stats.ema_coherence = 0.0;
        let q = entity_quality(&stats, 0.01);
        assert!((q - 0.01f64.powf(0.2)).abs() < 1e-12);
    }
}
