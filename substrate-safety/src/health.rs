//! Per-mechanism run history: success rate, latency, and missed runs.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Deferred,
    Failed,
}

impl RunOutcome {
    /// Deferred and failed runs both count toward the missed-run streak.
    pub fn is_missed(&self) -> bool {
        !matches!(self, RunOutcome::Completed)
    }
}

/// A failed or deferred run, kept for the next failure record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismFailure {
    pub mechanism: String,
    pub cycle: u64,
    pub outcome: RunOutcome,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
struct Track {
    window: VecDeque<(RunOutcome, f64)>,
    consecutive_missed: u32,
    last_latency_ms: f64,
}

/// Rolling health of every mechanism the engine has scheduled.
#[derive(Debug, Clone)]
pub struct MechanismHealth {
    window: usize,
    tracks: BTreeMap<String, Track>,
    failures: Vec<MechanismFailure>,
}

impl MechanismHealth {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            tracks: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        mechanism: &str,
        cycle: u64,
        outcome: RunOutcome,
        latency_ms: f64,
        reason: Option<&str>,
    ) {
        let track = self.tracks.entry(mechanism.to_string()).or_default();
        track.window.push_back((outcome, latency_ms));
        while track.window.len() > self.window {
            track.window.pop_front();
        }
        track.last_latency_ms = latency_ms;
        if outcome.is_missed() {
            track.consecutive_missed += 1;
            self.failures.push(MechanismFailure {
                mechanism: mechanism.to_string(),
                cycle,
                outcome,
                reason: reason.unwrap_or_default().to_string(),
            });
        } else {
            track.consecutive_missed = 0;
        }
    }

    /// Share of non-failed runs in the window, once `min_runs` are recorded.
    pub fn success_rate(&self, mechanism: &str, min_runs: usize) -> Option<f64> {
        let track = self.tracks.get(mechanism)?;
        if track.window.len() < min_runs.max(1) {
            return None;
        }
        let ok = track
            .window
            .iter()
            .filter(|(o, _)| *o != RunOutcome::Failed)
            .count();
        Some(ok as f64 / track.window.len() as f64)
    }

    /// Lowest judged success rate and the mechanism it belongs to.
    pub fn worst_success_rate(&self, min_runs: usize) -> Option<(String, f64)> {
        self.tracks
            .keys()
            .filter_map(|name| self.success_rate(name, min_runs).map(|r| (name.clone(), r)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Slowest most-recent run.
    pub fn max_latency_ms(&self) -> Option<(String, f64)> {
        self.tracks
            .iter()
            .map(|(name, t)| (name.clone(), t.last_latency_ms))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Longest current streak of missed runs.
    pub fn max_missed(&self) -> Option<(String, u32)> {
        self.tracks
            .iter()
            .map(|(name, t)| (name.clone(), t.consecutive_missed))
            .max_by_key(|(_, missed)| *missed)
    }

    pub fn consecutive_missed(&self, mechanism: &str) -> u32 {
        self.tracks.get(mechanism).map_or(0, |t| t.consecutive_missed)
    }

    /// Failures and deferrals recorded since the last drain.
    pub fn failures(&self) -> &[MechanismFailure] {
        &self.failures
    }

    pub fn drain_failures(&mut self) -> Vec<MechanismFailure> {
        std::mem::take(&mut self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_waits_for_enough_runs() {
        let mut health = MechanismHealth::new(20);
        for cycle in 0..4 {
            health.record("decay", cycle, RunOutcome::Completed, 1.0, None);
        }
        assert_eq!(health.success_rate("decay", 5), None);
        health.record("decay", 4, RunOutcome::Failed, 1.0, Some("boom"));
        assert_eq!(health.success_rate("decay", 5), Some(0.8));
    }

    #[test]
    fn window_rolls_and_missed_streak_resets() {
        let mut health = MechanismHealth::new(3);
        health.record("m", 0, RunOutcome::Failed, 2.0, Some("x"));
        health.record("m", 1, RunOutcome::Deferred, 2.0, Some("busy"));
        assert_eq!(health.consecutive_missed("m"), 2);
        for cycle in 2..5 {
            health.record("m", cycle, RunOutcome::Completed, 2.0, None);
        }
        assert_eq!(health.consecutive_missed("m"), 0);
        assert_eq!(health.success_rate("m", 1), Some(1.0));
        assert_eq!(health.drain_failures().len(), 2);
        assert!(health.failures().is_empty());
    }
}
