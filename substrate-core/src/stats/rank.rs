//! Van der Waerden rank scores with average ranks for ties.

use std::cmp::Ordering;

use statrs::distribution::{ContinuousCDF, Normal};

/// 1-based ranks with ties sharing their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j share rank (i+1 + j+1) / 2.
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = shared;
        }
        i = j + 1;
    }
    ranks
}

/// Standard normal quantile. Exactly 0 at the median.
pub fn probit(p: f64) -> f64 {
    if (p - 0.5).abs() < 1e-12 {
        return 0.0;
    }
    let p = p.clamp(1e-12, 1.0 - 1e-12);
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(p),
        Err(_) => 0.0,
    }
}

/// Van der Waerden scores: `Φ⁻¹(rank / (n + 1))`.
///
/// No mean or variance is assumed, so the score only says where a value
/// stands among its peers.
pub fn rank_z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    average_ranks(values)
        .into_iter()
        .map(|r| probit(r / (n + 1.0)))
        .collect()
}

/// Rank z of `values[index]`, or the raw value when the cohort is smaller
/// than `min_cohort`.
pub fn z_or_raw(values: &[f64], index: usize, min_cohort: usize) -> f64 {
    let Some(&raw) = values.get(index) else {
        return 0.0;
    };
    if values.len() < min_cohort {
        return raw;
    }
    rank_z_scores(values).get(index).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_average_rank() {
        assert_eq!(average_ranks(&[5.0, 1.0, 5.0]), vec![2.5, 1.0, 2.5]);
    }

    #[test]
    fn all_tied_cohort_scores_zero() {
        assert!(rank_z_scores(&[0.0; 6]).iter().all(|z| *z == 0.0));
    }

    #[test]
    fn unique_maximum_scores_positive() {
        let z = rank_z_scores(&[0.0, 0.0, 0.0, 0.3]);
        assert!(z[3] > 0.0);
        assert!(z[0] < 0.0);
    }

    #[test]
    fn small_cohort_uses_raw_value() {
        assert_eq!(z_or_raw(&[0.3, 0.1], 0, 3), 0.3);
    }
}
