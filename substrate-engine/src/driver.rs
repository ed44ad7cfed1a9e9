//! Async driver: runs cycles on a fixed tick until told to stop.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use substrate_core::SubstrateResult;

use crate::engine::{CycleEngine, CycleOutcome};

/// Why [`CycleEngine::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverExit {
    /// The stop signal was raised. `cycles` ran in this call.
    Stopped { cycles: u64 },
    /// A cycle ended in an emergency pause.
    Paused { cycles: u64, record_id: String },
}

impl CycleEngine {
    /// Run cycles every `tick_interval_ms` until `stop` reads `true` or a
    /// cycle pauses. The stop signal is only checked between cycles.
    ///
    /// An unavailable backend is retried on the next tick; any other error
    /// ends the loop.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> SubstrateResult<DriverExit> {
        let tick = Duration::from_millis(self.config().engine.tick_interval_ms);
        let mut cycles = 0;
        info!(tick_ms = tick.as_millis() as u64, "cycle driver started");
        loop {
            if *stop.borrow() {
                info!(cycles, "cycle driver stopped");
                return Ok(DriverExit::Stopped { cycles });
            }
            match self.run_cycle() {
                Ok(CycleOutcome::Committed { .. }) => cycles += 1,
                Ok(CycleOutcome::Paused { record_id, .. }) => {
                    return Ok(DriverExit::Paused {
                        cycles: cycles + 1,
                        record_id,
                    });
                }
                Err(e) if e.is_backend_unavailable() => {
                    warn!(error = %e, "backend unavailable, retrying next tick");
                }
                Err(e) => return Err(e),
            }
            tokio::select! {
                _ = tokio::time::sleep(tick) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        // stop sender dropped
                        return Ok(DriverExit::Stopped { cycles });
                    }
                }
            }
        }
    }
}
