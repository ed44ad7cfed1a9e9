//! # substrate-engine
//!
//! Drives the substrate one cycle at a time: queued stimuli are applied,
//! every registered mechanism runs against a staged copy of the working
//! state, the safety monitor scores the result, and the cycle is either
//! committed to the backend as one batch or turned into an emergency pause.

pub mod driver;
pub mod engine;
pub mod registry;
pub mod stimulus;

pub use driver::DriverExit;
pub use engine::{CycleEngine, CycleOutcome};
pub use registry::MechanismRegistry;
pub use stimulus::{apply_stimulus, Stimulus};
