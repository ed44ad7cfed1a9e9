//! The safety indicators and how a value maps to a level.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use substrate_core::config::{Band, SafetyConfig};
use substrate_core::stats::{jaccard, linear_fit};

use crate::snapshot::SystemSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Repetition,
    EnergyChange,
    EnergyEntropy,
    GrowthCount,
    GrowthRate,
    IsolatedFraction,
    ComponentRatio,
    HubFraction,
    MechanismSuccess,
    MechanismLatency,
    MissedRuns,
}

impl Indicator {
    pub const ALL: &'static [Indicator] = &[
        Indicator::Repetition,
        Indicator::EnergyChange,
        Indicator::EnergyEntropy,
        Indicator::GrowthCount,
        Indicator::GrowthRate,
        Indicator::IsolatedFraction,
        Indicator::ComponentRatio,
        Indicator::HubFraction,
        Indicator::MechanismSuccess,
        Indicator::MechanismLatency,
        Indicator::MissedRuns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Repetition => "repetition",
            Indicator::EnergyChange => "energy_change",
            Indicator::EnergyEntropy => "energy_entropy",
            Indicator::GrowthCount => "growth_count",
            Indicator::GrowthRate => "growth_rate",
            Indicator::IsolatedFraction => "isolated_fraction",
            Indicator::ComponentRatio => "component_ratio",
            Indicator::HubFraction => "hub_fraction",
            Indicator::MechanismSuccess => "mechanism_success",
            Indicator::MechanismLatency => "mechanism_latency_ms",
            Indicator::MissedRuns => "missed_runs",
        }
    }

    /// Entropy and success rate alarm when they fall; everything else when it rises.
    pub fn lower_is_worse(&self) -> bool {
        matches!(self, Indicator::EnergyEntropy | Indicator::MechanismSuccess)
    }

    pub fn band(&self, config: &SafetyConfig) -> Band {
        match self {
            Indicator::Repetition => config.repetition,
            Indicator::EnergyChange => config.energy_change,
            Indicator::EnergyEntropy => config.energy_entropy,
            Indicator::GrowthCount => config.growth_count,
            Indicator::GrowthRate => config.growth_rate,
            Indicator::IsolatedFraction => config.isolated_fraction,
            Indicator::ComponentRatio => config.component_ratio,
            Indicator::HubFraction => config.hub_fraction,
            Indicator::MechanismSuccess => config.mechanism_success,
            Indicator::MechanismLatency => config.mechanism_latency_ms,
            Indicator::MissedRuns => config.missed_runs,
        }
    }

    pub fn classify(&self, value: f64, config: &SafetyConfig) -> Level {
        classify(value, self.band(config), self.lower_is_worse())
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Healthy => "healthy",
            Level::Warning => "warning",
            Level::Critical => "critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Place `value` in a band. Edges belong to the worse level.
pub fn classify(value: f64, band: Band, lower_is_worse: bool) -> Level {
    if value.is_nan() {
        return Level::Critical;
    }
    let (warn, crit) = if lower_is_worse {
        (value <= band.warning, value <= band.critical)
    } else {
        (value >= band.warning, value >= band.critical)
    };
    if crit {
        Level::Critical
    } else if warn {
        Level::Warning
    } else {
        Level::Healthy
    }
}

/// One indicator's value this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub indicator: Indicator,
    pub value: f64,
    pub level: Level,
    /// Consecutive evaluations at warning or worse, this one included.
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Reading {
    pub fn new(indicator: Indicator, value: f64, config: &SafetyConfig) -> Self {
        Self {
            indicator,
            value,
            level: indicator.classify(value, config),
            streak: 0,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Mean Jaccard similarity of `current` against each remembered active set,
/// scaled by how often sub-traversals failed to finish. 0.0 with no history.
pub fn repetition(
    current: &BTreeSet<String>,
    history: &VecDeque<BTreeSet<String>>,
    completion_rate: f64,
) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let mean = history.iter().map(|past| jaccard(current, past)).sum::<f64>() / history.len() as f64;
    mean * (1.0 - completion_rate.clamp(0.0, 1.0))
}

/// `|E_after − E_before| / E_before`. From an empty graph any energy at all is a full change.
pub fn energy_change(before: &SystemSnapshot, after: &SystemSnapshot) -> f64 {
    let delta = (after.total_energy - before.total_energy).abs();
    if before.total_energy <= f64::EPSILON {
        return if after.total_energy <= f64::EPSILON { 0.0 } else { 1.0 };
    }
    delta / before.total_energy
}

/// The lower of the two snapshots' entropies. A graph with no energy to
/// distribute reads as fully spread.
pub fn energy_entropy(before: &SystemSnapshot, after: &SystemSnapshot) -> f64 {
    before
        .energy_entropy
        .unwrap_or(1.0)
        .min(after.energy_entropy.unwrap_or(1.0))
}

/// Slope of `ln(size)` against time, per hour. 0.0 until the samples are
/// numerous enough and span enough time to fit.
pub fn growth_rate(samples: &VecDeque<(DateTime<Utc>, usize)>, config: &SafetyConfig) -> f64 {
    let (Some((first, _)), Some((last, _))) = (samples.front(), samples.back()) else {
        return 0.0;
    };
    if samples.len() < config.growth_fit_min_samples
        || (*last - *first).num_seconds() < config.growth_fit_min_span_secs
    {
        return 0.0;
    }
    let xs: Vec<f64> = samples
        .iter()
        .map(|(at, _)| (*at - *first).num_milliseconds() as f64 / 1000.0)
        .collect();
    let ys: Vec<f64> = samples.iter().map(|(_, size)| (*size as f64).max(1.0).ln()).collect();
    linear_fit(&xs, &ys).map_or(0.0, |(slope, _)| slope * 3600.0)
}

fn fraction(count: usize, of: usize) -> f64 {
    if of == 0 {
        0.0
    } else {
        count as f64 / of as f64
    }
}

pub fn isolated_fraction(snapshot: &SystemSnapshot) -> f64 {
    fraction(snapshot.isolated_count, snapshot.node_count)
}

pub fn component_ratio(snapshot: &SystemSnapshot) -> f64 {
    fraction(snapshot.component_count, snapshot.node_count)
}

pub fn hub_fraction(snapshot: &SystemSnapshot) -> f64 {
    fraction(snapshot.hub_count, snapshot.node_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn band_edges_belong_to_the_worse_level() {
        let band = Band::new(0.8, 0.95);
        assert_eq!(classify(0.5, band, false), Level::Healthy);
        assert_eq!(classify(0.8, band, false), Level::Warning);
        assert_eq!(classify(0.95, band, false), Level::Critical);

        let band = Band::new(0.3, 0.1);
        assert_eq!(classify(0.9, band, true), Level::Healthy);
        assert_eq!(classify(0.3, band, true), Level::Warning);
        assert_eq!(classify(0.05, band, true), Level::Critical);
        assert_eq!(classify(f64::NAN, band, true), Level::Critical);
    }

    #[test]
    fn repetition_needs_both_sameness_and_unfinished_work() {
        let current = set(&["a", "b"]);
        let history: VecDeque<_> = vec![set(&["a", "b"]), set(&["a", "b"])].into();
        assert_eq!(repetition(&current, &history, 1.0), 0.0);
        assert!((repetition(&current, &history, 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(repetition(&current, &VecDeque::new(), 0.0), 0.0);

        let history: VecDeque<_> = vec![set(&["a", "b"]), set(&["c"])].into();
        assert!((repetition(&current, &history, 0.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn growth_rate_recovers_an_exponential() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let config = SafetyConfig::default();
        // size doubles every hour: ln 2 per hour
        let samples: VecDeque<_> = (0..7)
            .map(|i| {
                let secs = i * 600;
                let size = 1000.0 * (std::f64::consts::LN_2 * secs as f64 / 3600.0).exp();
                (t0 + Duration::seconds(secs), size.round() as usize)
            })
            .collect();
        let rate = growth_rate(&samples, &config);
        assert!((rate - std::f64::consts::LN_2).abs() < 0.01, "rate {rate}");

        let short: VecDeque<_> = samples.iter().take(3).copied().collect();
        assert_eq!(growth_rate(&short, &config), 0.0);
    }
}
