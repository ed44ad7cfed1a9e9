//! Cohort-relative standardisation of a freshly updated EMA.

use substrate_core::stats::z_or_raw;

/// Rank z of `new_value` among the cohort's previous values, with the
/// record's own previous value at `position` replaced by `new_value`.
///
/// Below `min_cohort` members the raw value is returned.
pub fn cohort_z(previous: &[f64], position: usize, new_value: f64, min_cohort: usize) -> f64 {
    let mut values = previous.to_vec();
    match values.get_mut(position) {
        Some(own) => *own = new_value,
        None => return new_value,
    }
    z_or_raw(&values, position, min_cohort)
}
