//! Distribution and similarity measures: entropy, Jaccard, cosine,
//! geometric mean, least-squares fit.

use std::collections::BTreeSet;

/// Shannon entropy of a non-negative distribution divided by `ln(n)`,
/// where `n` counts every slot including empty ones.
///
/// Returns `None` when total mass is zero or there is a single slot.
pub fn normalized_entropy(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let h: f64 = values
        .iter()
        .filter(|v| **v > 0.0)
        .map(|v| {
            let p = v / total;
            -p * p.ln()
        })
        .sum();
    Some((h / (n as f64).ln()).clamp(0.0, 1.0))
}

/// Geometric mean with each value floored at `floor`.
pub fn geometric_mean(values: &[f64], floor: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let log_sum: f64 = values.iter().map(|v| v.max(floor).ln()).sum();
    (log_sum / values.len() as f64).exp()
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Least-squares `(slope, intercept)`. `None` with fewer than two distinct xs.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        sxx += dx * dx;
        sxy += dx * (ys[i] - mean_y);
    }
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// |A ∩ B| / |A ∪ B|; 1.0 for two empty sets.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    inter / union
}
