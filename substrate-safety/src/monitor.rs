//! The monitor: turns a pair of snapshots into readings, tracks streaks,
//! and builds the failure record when something goes critical.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use substrate_core::config::SafetyConfig;
use substrate_core::traits::FailureEntry;
use substrate_core::SubstrateResult;

use crate::health::{MechanismFailure, MechanismHealth, RunOutcome};
use crate::indicators::{self, Indicator, Level, Reading};
use crate::snapshot::SystemSnapshot;

/// Every indicator for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub cycle: u64,
    pub at: DateTime<Utc>,
    pub readings: Vec<Reading>,
    pub overall: Level,
}

impl SafetyReport {
    pub fn is_critical(&self) -> bool {
        self.overall == Level::Critical
    }

    pub fn reading(&self, indicator: Indicator) -> Option<&Reading> {
        self.readings.iter().find(|r| r.indicator == indicator)
    }

    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(move |r| r.level == level)
    }
}

/// Post-mortem for an emergency pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub id: String,
    pub cycle: u64,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub before: SystemSnapshot,
    pub after: SystemSnapshot,
    /// The readings that were critical.
    pub triggers: Vec<Reading>,
    pub mechanism_failures: Vec<MechanismFailure>,
}

impl FailureRecord {
    pub fn to_entry(&self) -> SubstrateResult<FailureEntry> {
        Ok(FailureEntry {
            id: self.id.clone(),
            cycle: self.cycle,
            created_at: self.created_at,
            summary: self.summary.clone(),
            body: serde_json::to_value(self)?,
            acknowledged_at: None,
        })
    }
}

/// Cloning gives an independent copy, so a caller can evaluate a cycle
/// tentatively and keep the result only if the cycle lands.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    config: SafetyConfig,
    active_history: VecDeque<BTreeSet<String>>,
    size_samples: VecDeque<(DateTime<Utc>, usize)>,
    streaks: BTreeMap<Indicator, u32>,
    health: MechanismHealth,
}

impl SafetyMonitor {
    pub fn new(config: SafetyConfig) -> Self {
        let health = MechanismHealth::new(config.mechanism_window);
        Self {
            config,
            active_history: VecDeque::new(),
            size_samples: VecDeque::new(),
            streaks: BTreeMap::new(),
            health,
        }
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    pub fn health(&self) -> &MechanismHealth {
        &self.health
    }

    pub fn record_run(
        &mut self,
        mechanism: &str,
        cycle: u64,
        outcome: RunOutcome,
        latency_ms: f64,
        reason: Option<&str>,
    ) {
        self.health.record(mechanism, cycle, outcome, latency_ms, reason);
    }

    /// Score the cycle that took the graph from `before` to `after`, then
    /// remember `after` for the repetition and growth indicators.
    pub fn evaluate(
        &mut self,
        before: &SystemSnapshot,
        after: &SystemSnapshot,
        completion_rate: f64,
    ) -> SafetyReport {
        let cfg = &self.config;
        let mut readings = vec![
            Reading::new(
                Indicator::Repetition,
                indicators::repetition(&after.active_nodes, &self.active_history, completion_rate),
                cfg,
            ),
            Reading::new(Indicator::EnergyChange, indicators::energy_change(before, after), cfg),
            Reading::new(Indicator::EnergyEntropy, indicators::energy_entropy(before, after), cfg),
            Reading::new(Indicator::GrowthCount, after.created_recently as f64, cfg),
        ];

        self.size_samples.push_back((after.at, after.size()));
        let horizon = after.at - chrono::Duration::seconds(cfg.growth_window_secs);
        while self.size_samples.len() > cfg.history_capacity
            || self.size_samples.front().is_some_and(|(at, _)| *at < horizon)
        {
            self.size_samples.pop_front();
        }
        readings.push(Reading::new(
            Indicator::GrowthRate,
            indicators::growth_rate(&self.size_samples, cfg),
            cfg,
        ));

        readings.push(Reading::new(
            Indicator::IsolatedFraction,
            indicators::isolated_fraction(after),
            cfg,
        ));
        readings.push(Reading::new(
            Indicator::ComponentRatio,
            indicators::component_ratio(after),
            cfg,
        ));
        readings.push(Reading::new(Indicator::HubFraction, indicators::hub_fraction(after), cfg));

        readings.push(match self.health.worst_success_rate(cfg.mechanism_min_runs) {
            Some((name, rate)) => Reading::new(Indicator::MechanismSuccess, rate, cfg).with_detail(name),
            None => Reading::new(Indicator::MechanismSuccess, 1.0, cfg),
        });
        readings.push(match self.health.max_latency_ms() {
            Some((name, ms)) => Reading::new(Indicator::MechanismLatency, ms, cfg).with_detail(name),
            None => Reading::new(Indicator::MechanismLatency, 0.0, cfg),
        });
        readings.push(match self.health.max_missed() {
            Some((name, missed)) if missed > 0 => {
                Reading::new(Indicator::MissedRuns, missed as f64, cfg).with_detail(name)
            }
            _ => Reading::new(Indicator::MissedRuns, 0.0, cfg),
        });

        for reading in &mut readings {
            let streak = self.streaks.entry(reading.indicator).or_insert(0);
            *streak = if reading.level == Level::Healthy { 0 } else { *streak + 1 };
            reading.streak = *streak;
            if reading.level == Level::Warning {
                warn!(
                    indicator = %reading.indicator,
                    value = reading.value,
                    streak = reading.streak,
                    detail = reading.detail.as_deref().unwrap_or(""),
                    "safety warning"
                );
            }
        }

        self.active_history.push_back(after.active_nodes.clone());
        while self.active_history.len() > cfg.repetition_window {
            self.active_history.pop_front();
        }

        let overall = readings.iter().map(|r| r.level).max().unwrap_or_default();
        debug!(cycle = after.cycle, %overall, "safety evaluated");
        SafetyReport {
            cycle: after.cycle,
            at: after.at,
            readings,
            overall,
        }
    }

    /// Build the post-mortem for a critical report. Consumes the mechanism
    /// failures recorded so far.
    pub fn failure_record(
        &mut self,
        report: &SafetyReport,
        before: &SystemSnapshot,
        after: &SystemSnapshot,
    ) -> FailureRecord {
        let triggers: Vec<Reading> = report.at_level(Level::Critical).cloned().collect();
        let summary = triggers
            .iter()
            .map(|r| match &r.detail {
                Some(d) => format!("{}={:.4} ({d})", r.indicator, r.value),
                None => format!("{}={:.4}", r.indicator, r.value),
            })
            .collect::<Vec<_>>()
            .join(", ");
        FailureRecord {
            id: uuid::Uuid::new_v4().to_string(),
            cycle: report.cycle,
            created_at: report.at,
            summary: format!("critical at cycle {}: {summary}", report.cycle),
            before: before.clone(),
            after: after.clone(),
            triggers,
            mechanism_failures: self.health.drain_failures(),
        }
    }

    /// Forget the run history after an operator acknowledges a pause.
    pub fn reset_after_acknowledge(&mut self) {
        self.streaks.clear();
        self.health = MechanismHealth::new(self.config.mechanism_window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_fixtures::ring_graph;

    #[test]
    fn streaks_count_consecutive_warnings() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let state = ring_graph(10, now);
        let mut monitor = SafetyMonitor::new(SafetyConfig::default());
        let snap = SystemSnapshot::capture(&state, monitor.config());

        monitor.record_run("m", 0, RunOutcome::Deferred, 1.0, Some("busy"));
        let first = monitor.evaluate(&snap, &snap, 1.0);
        let missed = first.reading(Indicator::MissedRuns).unwrap();
        assert_eq!(missed.level, Level::Warning);
        assert_eq!(missed.streak, 1);

        monitor.record_run("m", 1, RunOutcome::Completed, 1.0, None);
        let second = monitor.evaluate(&snap, &snap, 1.0);
        assert_eq!(second.reading(Indicator::MissedRuns).unwrap().streak, 0);
        assert_eq!(second.overall, Level::Healthy);
    }
}
