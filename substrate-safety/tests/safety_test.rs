//! Safety monitor scenarios: entropy collapse, runaway growth,
//! fragmentation, mechanism health, and failure records.

use chrono::{DateTime, Duration, TimeZone, Utc};

use substrate_core::config::SafetyConfig;
use substrate_safety::{Indicator, Level, RunOutcome, SafetyMonitor, SystemSnapshot};
use test_fixtures::{concept_node, isolated_graph, seeded_graph};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

#[test]
fn seeded_graph_is_healthy() {
    let state = seeded_graph(100, 200, 42, t0());
    let mut monitor = SafetyMonitor::new(SafetyConfig::default());
    let snap = SystemSnapshot::capture(&state, monitor.config());
    let report = monitor.evaluate(&snap, &snap, 1.0);
    assert_eq!(report.overall, Level::Healthy, "{:?}", report.readings);
    assert_eq!(report.readings.len(), Indicator::ALL.len());
}

#[test]
fn energy_piled_on_one_node_is_an_entropy_collapse() {
    let mut state = seeded_graph(100, 200, 42, t0());
    let mut monitor = SafetyMonitor::new(SafetyConfig::default());
    let before = SystemSnapshot::capture(&state, monitor.config());

    let total = state.total_energy();
    for node in state.nodes_mut() {
        node.energy = 0.0;
    }
    state.node_mut("n0000").unwrap().energy = total;
    let after = SystemSnapshot::capture(&state, monitor.config());

    let report = monitor.evaluate(&before, &after, 1.0);
    let entropy = report.reading(Indicator::EnergyEntropy).unwrap();
    assert_eq!(entropy.value, 0.0);
    assert_eq!(entropy.level, Level::Critical);
    assert!(report.reading(Indicator::EnergyChange).unwrap().value < 1e-9);
    assert!(report.is_critical());
}

#[test]
fn two_thousand_new_records_in_an_hour_is_critical_growth() {
    let mut state = seeded_graph(100, 200, 42, t0());
    let mut monitor = SafetyMonitor::new(SafetyConfig::default());
    let mut before = SystemSnapshot::capture(&state, monitor.config());
    let mut last = None;

    for step in 1..=6 {
        state.now = t0() + Duration::seconds(step * 600);
        for i in 0..350 {
            let id = format!("grown-{step}-{i:03}");
            state.insert_node(concept_node(&id, 0.0, state.now)).unwrap();
        }
        let after = SystemSnapshot::capture(&state, monitor.config());
        last = Some(monitor.evaluate(&before, &after, 1.0));
        before = after;
    }

    let report = last.unwrap();
    let count = report.reading(Indicator::GrowthCount).unwrap();
    assert_eq!(count.value, 2_400.0);
    assert_eq!(count.level, Level::Critical);
    assert!(report.reading(Indicator::GrowthRate).unwrap().level >= Level::Warning);
}

#[test]
fn fully_expired_graph_is_fragmented() {
    let state = isolated_graph(500, t0());
    let mut monitor = SafetyMonitor::new(SafetyConfig::default());
    let snap = SystemSnapshot::capture(&state, monitor.config());
    let report = monitor.evaluate(&snap, &snap, 1.0);

    for indicator in [Indicator::IsolatedFraction, Indicator::ComponentRatio] {
        let reading = report.reading(indicator).unwrap();
        assert_eq!(reading.value, 1.0);
        assert_eq!(reading.level, Level::Critical);
    }

    let record = monitor.failure_record(&report, &snap, &snap);
    assert!(record.summary.contains("isolated_fraction"));
    let entry = record.to_entry().unwrap();
    assert_eq!(entry.id, record.id);
    assert_eq!(entry.body["after"]["node_count"], 500);
    assert!(entry.acknowledged_at.is_none());
}

#[test]
fn failing_mechanism_degrades_then_goes_critical() {
    let state = seeded_graph(100, 200, 42, t0());
    let mut monitor = SafetyMonitor::new(SafetyConfig::default());
    let snap = SystemSnapshot::capture(&state, monitor.config());

    for cycle in 0..5 {
        monitor.record_run("steady", cycle, RunOutcome::Completed, 3.0, None);
    }
    monitor.record_run("flaky", 5, RunOutcome::Failed, 3.0, Some("boom"));
    let report = monitor.evaluate(&snap, &snap, 1.0);
    assert_eq!(report.reading(Indicator::MissedRuns).unwrap().level, Level::Warning);
    assert_eq!(report.overall, Level::Warning);

    monitor.record_run("flaky", 6, RunOutcome::Failed, 3.0, Some("boom"));
    let report = monitor.evaluate(&snap, &snap, 1.0);
    let missed = report.reading(Indicator::MissedRuns).unwrap();
    assert_eq!(missed.level, Level::Critical);
    assert_eq!(missed.detail.as_deref(), Some("flaky"));
    assert_eq!(missed.streak, 2);

    let record = monitor.failure_record(&report, &snap, &snap);
    assert_eq!(record.mechanism_failures.len(), 2);
    assert!(monitor.health().failures().is_empty());
}

#[test]
fn slow_mechanism_trips_latency() {
    let state = seeded_graph(100, 200, 42, t0());
    let mut monitor = SafetyMonitor::new(SafetyConfig::default());
    let snap = SystemSnapshot::capture(&state, monitor.config());
    monitor.record_run("slow", 0, RunOutcome::Completed, 12_000.0, None);
    let report = monitor.evaluate(&snap, &snap, 1.0);
    let latency = report.reading(Indicator::MechanismLatency).unwrap();
    assert_eq!(latency.level, Level::Critical);
    assert_eq!(latency.detail.as_deref(), Some("slow"));
}
