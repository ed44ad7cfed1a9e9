use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::events::TelemetryEvent;

/// Where telemetry goes. Emitting never blocks the cycle.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: &TelemetryEvent);
}

/// Bounded channel. Events are dropped, and counted, when the consumer lags.
pub struct ChannelSink {
    sender: Sender<TelemetryEvent>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn bounded(capacity: usize) -> (Self, Receiver<TelemetryEvent>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for ChannelSink {
    fn emit(&self, event: &TelemetryEvent) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    tracing::warn!(dropped, "telemetry channel full, dropping events");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Writes every event to the log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn emit(&self, event: &TelemetryEvent) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(
                target: "substrate.telemetry",
                kind = event.kind(),
                cycle = event.cycle(),
                %json
            ),
            Err(e) => tracing::warn!(kind = event.kind(), error = %e, "unserializable event"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&self, _event: &TelemetryEvent) {}
}
