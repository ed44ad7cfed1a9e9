//! A telemetry sink that keeps everything it is given.

use std::sync::Mutex;

use substrate_observability::{TelemetryEvent, TelemetrySink};

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Events whose `kind()` is `kind`.
    pub fn of_kind(&self, kind: &str) -> Vec<TelemetryEvent> {
        self.events().into_iter().filter(|e| e.kind() == kind).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&self, event: &TelemetryEvent) {
        let mut guard = match self.events.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(event.clone());
    }
}
