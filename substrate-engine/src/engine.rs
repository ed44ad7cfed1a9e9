//! [`CycleEngine`]: owns the committed state and runs one cycle at a time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{error, info, warn};

use substrate_core::errors::SafetyError;
use substrate_core::traits::{Clock, FailureLog, GraphBackend, Mechanism, MechanismStatus, SystemClock};
use substrate_core::{GraphState, SubstrateConfig, SubstrateResult};
use substrate_observability::{
    commit_span, cycle_span, mechanism_span, safety_span, CycleReport, NullSink, ReadingReport,
    TelemetryEvent, TelemetrySink,
};
use substrate_safety::{RunOutcome, SafetyMonitor, SafetyReport, SystemSnapshot};
use substrate_storage::{GraphStore, SqliteBackend};

use crate::registry::MechanismRegistry;
use crate::stimulus::{apply_stimulus, Stimulus};

/// How a cycle ended when it did not return an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Changes were written to the backend.
    Committed {
        cycle: u64,
        records_written: usize,
        report: SafetyReport,
    },
    /// A critical reading stopped the cycle. Nothing was written.
    Paused {
        cycle: u64,
        record_id: String,
        report: SafetyReport,
    },
}

impl CycleOutcome {
    pub fn cycle(&self) -> u64 {
        match self {
            CycleOutcome::Committed { cycle, .. } | CycleOutcome::Paused { cycle, .. } => *cycle,
        }
    }

    pub fn report(&self) -> &SafetyReport {
        match self {
            CycleOutcome::Committed { report, .. } | CycleOutcome::Paused { report, .. } => report,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, CycleOutcome::Paused { .. })
    }
}

pub struct CycleEngine {
    config: SubstrateConfig,
    store: GraphStore,
    failure_log: Arc<dyn FailureLog>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TelemetrySink>,
    registry: MechanismRegistry,
    monitor: SafetyMonitor,
    /// Last committed state. Never touched by a cycle that does not commit.
    state: GraphState,
    ingress_tx: Sender<Stimulus>,
    ingress_rx: Receiver<Stimulus>,
    /// Stimuli handed back by an aborted cycle, applied before new ones.
    requeued: VecDeque<Stimulus>,
    cycle: u64,
    last_tick: Option<DateTime<Utc>>,
    paused_on: Option<String>,
}

impl CycleEngine {
    /// An engine over `backend` with the default mechanisms, the system
    /// clock, and no telemetry. Call [`CycleEngine::load`] or
    /// [`CycleEngine::seed`] before the first cycle.
    pub fn new(
        config: SubstrateConfig,
        backend: Arc<dyn GraphBackend>,
        failure_log: Arc<dyn FailureLog>,
    ) -> SubstrateResult<Self> {
        config.validate()?;
        let (ingress_tx, ingress_rx) = unbounded();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self {
            registry: MechanismRegistry::with_defaults(&config),
            monitor: SafetyMonitor::new(config.safety.clone()),
            store: GraphStore::new(backend),
            state: GraphState::new(clock.now()),
            failure_log,
            clock,
            sink: Arc::new(NullSink),
            ingress_tx,
            ingress_rx,
            requeued: VecDeque::new(),
            cycle: 0,
            last_tick: None,
            paused_on: None,
            config,
        })
    }

    /// Open the SQLite database named in the config, use it for both the
    /// graph and the failure log, and load the current graph.
    pub fn open(config: SubstrateConfig) -> SubstrateResult<Self> {
        let sqlite = Arc::new(SqliteBackend::from_config(&config.storage)?);
        let mut engine = Self::new(config, sqlite.clone(), sqlite)?;
        engine.load()?;
        Ok(engine)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.state.now = clock.now();
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Drop the default mechanisms in favour of `registry`.
    pub fn with_registry(mut self, registry: MechanismRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn register(&mut self, mechanism: Box<dyn Mechanism>) {
        self.registry.register(mechanism);
    }

    /// Read the current graph from the backend, and pick up any pause
    /// that was never acknowledged.
    pub fn load(&mut self) -> SubstrateResult<()> {
        self.state = self.store.load_state(self.clock.now())?;
        self.paused_on = self
            .failure_log
            .list()?
            .into_iter()
            .rev()
            .find(|e| e.acknowledged_at.is_none())
            .map(|e| e.id);
        if let Some(record_id) = &self.paused_on {
            warn!(%record_id, "starting paused: failure record awaits acknowledgement");
        }
        info!(
            nodes = self.state.node_count(),
            links = self.state.link_count(),
            entities = self.state.entity_count(),
            backend = self.store.backend().name(),
            "graph loaded"
        );
        Ok(())
    }

    /// Persist `state` as the starting graph and adopt it.
    pub fn seed(&mut self, mut state: GraphState) -> SubstrateResult<()> {
        let retired = state.take_retired();
        let records: Vec<_> = state.records().chain(retired).collect();
        self.store.put_all(&records)?;
        self.state = state;
        Ok(())
    }

    /// A handle for pushing stimuli from other threads or tasks.
    pub fn ingress(&self) -> Sender<Stimulus> {
        self.ingress_tx.clone()
    }

    pub fn submit(&self, stimulus: Stimulus) {
        // the engine holds a receiver, so the channel is never disconnected
        let _ = self.ingress_tx.send(stimulus);
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn monitor(&self) -> &SafetyMonitor {
        &self.monitor
    }

    pub fn config(&self) -> &SubstrateConfig {
        &self.config
    }

    /// Number of the last cycle that committed or paused.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The failure record blocking further cycles, if any.
    pub fn paused_on(&self) -> Option<&str> {
        self.paused_on.as_deref()
    }

    /// Clear an emergency pause. Only the record that caused it unblocks the engine.
    pub fn acknowledge(&mut self, record_id: &str) -> SubstrateResult<()> {
        match &self.paused_on {
            Some(pending) if pending == record_id => {
                self.failure_log.acknowledge(record_id, self.clock.now())?;
                self.monitor.reset_after_acknowledge();
                self.paused_on = None;
                info!(%record_id, "emergency pause acknowledged");
                Ok(())
            }
            _ => Err(SafetyError::UnknownFailureRecord {
                record_id: record_id.to_string(),
            }
            .into()),
        }
    }

    /// Run one full cycle.
    ///
    /// Errors from the backend abort the cycle: nothing is written, the
    /// committed state is untouched, and drained stimuli are requeued.
    pub fn run_cycle(&mut self) -> SubstrateResult<CycleOutcome> {
        if let Some(record_id) = &self.paused_on {
            return Err(SafetyError::EmergencyPaused {
                record_id: record_id.clone(),
            }
            .into());
        }
        let started = Instant::now();
        let cycle = self.cycle + 1;
        let now = self.clock.now();
        let dt = self.dt_seconds(now);
        let _span = cycle_span!(cycle).entered();

        let mut working = self.state.clone();
        working.begin_cycle(cycle, now, dt);

        let drained = self.drain_ingress();
        working.signals.injected_energy = self.apply_ingress(&mut working, &drained);

        // adopted only when the cycle commits or pauses
        let mut monitor = self.monitor.clone();
        let before = SystemSnapshot::capture(&working, monitor.config());
        self.run_mechanisms(&mut working, &mut monitor, cycle);
        let after = SystemSnapshot::capture(&working, monitor.config());

        let report = {
            let _span = safety_span!(cycle).entered();
            monitor.evaluate(&before, &after, working.signals.traversals.completion_rate())
        };
        self.emit(&TelemetryEvent::SafetyReadings {
            cycle,
            overall: report.overall.to_string(),
            readings: report
                .readings
                .iter()
                .map(|r| ReadingReport {
                    indicator: r.indicator.to_string(),
                    value: r.value,
                    level: r.level.to_string(),
                    streak: r.streak,
                })
                .collect(),
        });

        if report.is_critical() {
            let record = monitor.failure_record(&report, &before, &after);
            if let Err(e) = record.to_entry().and_then(|entry| self.failure_log.append(&entry)) {
                warn!(cycle, error = %e, "failure record not written, cycle aborted");
                self.requeue(drained);
                return Err(e);
            }
            self.monitor = monitor;
            error!(cycle, record_id = %record.id, summary = %record.summary, "emergency pause");
            self.emit(&TelemetryEvent::EmergencyPause {
                cycle,
                record_id: record.id.clone(),
                summary: record.summary.clone(),
            });
            self.paused_on = Some(record.id.clone());
            self.cycle = cycle;
            self.last_tick = Some(now);
            return Ok(CycleOutcome::Paused {
                cycle,
                record_id: record.id,
                report,
            });
        }

        let summary = {
            let _span = commit_span!(cycle, self.store.backend().name()).entered();
            match self.store.commit(&self.state, &working) {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(cycle, error = %e, "commit failed, cycle aborted");
                    self.requeue(drained);
                    return Err(e);
                }
            }
        };
        working.take_retired();
        self.monitor = monitor;

        let report_event = CycleReport {
            cycle,
            at: now,
            active_entities: working.signals.active_entities.iter().cloned().collect(),
            active_nodes: working.signals.active_nodes.len(),
            active_links: working.signals.active_links().len(),
            frontier_size: working.signals.frontier.len(),
            wm_nodes: working.signals.wm_nodes.iter().cloned().collect(),
            energy_before: before.total_energy,
            energy_after: after.total_energy,
            injected_energy: working.signals.injected_energy,
            decayed_energy: working.signals.decayed_energy,
            records_written: summary.total(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        for flip in &working.signals.entity_flips {
            self.emit(&TelemetryEvent::EntityFlip {
                cycle,
                entity_id: flip.entity_id.clone(),
                became_active: flip.became_active,
                energy: flip.energy,
                threshold: flip.threshold,
            });
        }
        for t in &working.signals.transitions {
            self.emit(&TelemetryEvent::LifecycleTransition {
                cycle,
                entity_id: t.entity_id.clone(),
                from: t.from.to_string(),
                to: t.to.to_string(),
                quality: t.quality,
                age: t.age,
                reason: t.reason.clone(),
            });
        }
        self.emit(&TelemetryEvent::CycleCompleted(report_event));

        self.state = working;
        self.cycle = cycle;
        self.last_tick = Some(now);
        Ok(CycleOutcome::Committed {
            cycle,
            records_written: summary.total(),
            report,
        })
    }

    fn dt_seconds(&self, now: DateTime<Utc>) -> f64 {
        match self.last_tick {
            Some(prev) if now > prev => (now - prev).num_milliseconds() as f64 / 1000.0,
            _ => self.config.engine.tick_interval_ms as f64 / 1000.0,
        }
    }

    /// Put stimuli from an aborted cycle back at the front of the queue.
    fn requeue(&mut self, drained: Vec<Stimulus>) {
        for stimulus in drained.into_iter().rev() {
            self.requeued.push_front(stimulus);
        }
    }

    fn drain_ingress(&mut self) -> Vec<Stimulus> {
        let limit = self.config.engine.max_stimuli_per_cycle;
        let mut drained = Vec::new();
        while drained.len() < limit {
            match self.requeued.pop_front() {
                Some(s) => drained.push(s),
                None => break,
            }
        }
        while drained.len() < limit {
            match self.ingress_rx.try_recv() {
                Ok(s) => drained.push(s),
                Err(_) => break,
            }
        }
        drained
    }

    /// A stimulus that fails is dropped with a warning. Text is applied to
    /// a copy first so a half-applied trace never leaks into the cycle.
    fn apply_ingress(&self, working: &mut GraphState, stimuli: &[Stimulus]) -> f64 {
        let agent = self.config.engine.agent_name.as_str();
        let mut injected = 0.0;
        for stimulus in stimuli {
            let result = if matches!(stimulus, Stimulus::Text(_)) {
                let mut staged = working.clone();
                apply_stimulus(&mut staged, stimulus, &self.config.activation, agent).map(|added| {
                    *working = staged;
                    added
                })
            } else {
                apply_stimulus(working, stimulus, &self.config.activation, agent)
            };
            match result {
                Ok(added) => injected += added,
                Err(e) => warn!(kind = stimulus.kind(), error = %e, "stimulus dropped"),
            }
        }
        injected
    }

    /// Each mechanism works on its own copy; only a run that returns `Ok`
    /// is kept.
    fn run_mechanisms(&mut self, working: &mut GraphState, monitor: &mut SafetyMonitor, cycle: u64) {
        let mut failures = Vec::new();
        for mechanism in self.registry.due(cycle) {
            let name = mechanism.name().to_string();
            let _span = mechanism_span!(name, cycle).entered();
            let mut staged = working.clone();
            let started = Instant::now();
            let result = mechanism.run(&mut staged);
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            match result {
                Ok(MechanismStatus::Completed) => {
                    *working = staged;
                    monitor
                        .record_run(&name, cycle, RunOutcome::Completed, latency_ms, None);
                }
                Ok(MechanismStatus::Deferred { reason }) => {
                    *working = staged;
                    warn!(mechanism = %name, %reason, "mechanism deferred");
                    monitor.record_run(
                        &name,
                        cycle,
                        RunOutcome::Deferred,
                        latency_ms,
                        Some(&reason),
                    );
                }
                Err(e) => {
                    let reason = e.to_string();
                    error!(mechanism = %name, error = %reason, "mechanism failed, changes discarded");
                    monitor
                        .record_run(&name, cycle, RunOutcome::Failed, latency_ms, Some(&reason));
                    failures.push((name, reason));
                }
            }
        }
        for (mechanism, reason) in failures {
            self.emit(&TelemetryEvent::MechanismFailed {
                cycle,
                mechanism,
                reason,
            });
        }
    }

    fn emit(&self, event: &TelemetryEvent) {
        self.sink.emit(event);
    }
}
