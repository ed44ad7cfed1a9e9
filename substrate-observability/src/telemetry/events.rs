use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Summary of one committed cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CycleReport {
    pub cycle: u64,
    pub at: DateTime<Utc>,
    pub active_entities: Vec<String>,
    pub active_nodes: usize,
    pub active_links: usize,
    pub frontier_size: usize,
    pub wm_nodes: Vec<String>,
    pub energy_before: f64,
    pub energy_after: f64,
    pub injected_energy: f64,
    pub decayed_energy: f64,
    pub records_written: usize,
    pub duration_ms: u64,
}

/// One safety indicator as seen by dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReadingReport {
    pub indicator: String,
    pub value: f64,
    /// `healthy`, `warning`, or `critical`.
    pub level: String,
    /// Consecutive cycles at warning or worse.
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum TelemetryEvent {
    CycleCompleted(CycleReport),
    SafetyReadings {
        cycle: u64,
        overall: String,
        readings: Vec<ReadingReport>,
    },
    LifecycleTransition {
        cycle: u64,
        entity_id: String,
        from: String,
        to: String,
        quality: f64,
        age: u64,
        reason: String,
    },
    EntityFlip {
        cycle: u64,
        entity_id: String,
        became_active: bool,
        energy: f64,
        threshold: f64,
    },
    MechanismFailed {
        cycle: u64,
        mechanism: String,
        reason: String,
    },
    EmergencyPause {
        cycle: u64,
        record_id: String,
        summary: String,
    },
}

impl TelemetryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEvent::CycleCompleted(_) => "cycle_completed",
            TelemetryEvent::SafetyReadings { .. } => "safety_readings",
            TelemetryEvent::LifecycleTransition { .. } => "lifecycle_transition",
            TelemetryEvent::EntityFlip { .. } => "entity_flip",
            TelemetryEvent::MechanismFailed { .. } => "mechanism_failed",
            TelemetryEvent::EmergencyPause { .. } => "emergency_pause",
        }
    }

    pub fn cycle(&self) -> u64 {
        match self {
            TelemetryEvent::CycleCompleted(r) => r.cycle,
            TelemetryEvent::SafetyReadings { cycle, .. }
            | TelemetryEvent::LifecycleTransition { cycle, .. }
            | TelemetryEvent::EntityFlip { cycle, .. }
            | TelemetryEvent::MechanismFailed { cycle, .. }
            | TelemetryEvent::EmergencyPause { cycle, .. } => *cycle,
        }
    }
}
