//! Cohort statistics. Every threshold in the engine is derived from these
//! per cycle rather than fixed.

mod ema;
mod measures;
mod rank;
mod robust;

pub use ema::{adaptive_eta, ema};
pub use measures::{cosine_similarity, geometric_mean, jaccard, linear_fit, normalized_entropy};
pub use rank::{average_ranks, probit, rank_z_scores, z_or_raw};
pub use robust::{mad, median, percentile, robust_threshold, robust_z};
