//! Median, MAD, and the `median + k·MAD` thresholds built on them.

use std::cmp::Ordering;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Median of the finite values. `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 0.5)
}

/// Median absolute deviation (unscaled).
pub fn mad(values: &[f64]) -> Option<f64> {
    let m = median(values)?;
    let deviations: Vec<f64> = values
        .iter()
        .filter(|x| x.is_finite())
        .map(|x| (x - m).abs())
        .collect();
    median(&deviations)
}

/// Linear-interpolated quantile, `q` in [0, 1].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let v = sorted(values);
    if v.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(v[lo] + (v[hi] - v[lo]) * frac)
}

/// `max(floor, median + k·MAD)`; `floor` for an empty cohort.
pub fn robust_threshold(values: &[f64], k: f64, floor: f64) -> f64 {
    match (median(values), mad(values)) {
        (Some(m), Some(d)) => (m + k * d).max(floor),
        _ => floor,
    }
}

/// `(x − median) / (1.4826·MAD)`. Zero when the cohort has no spread.
pub fn robust_z(x: f64, values: &[f64]) -> f64 {
    let (Some(m), Some(d)) = (median(values), mad(values)) else {
        return 0.0;
    };
    let scale = 1.4826 * d;
    if scale <= f64::EPSILON {
        return 0.0;
    }
    (x - m) / scale
}
