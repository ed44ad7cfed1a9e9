//! # substrate-safety
//!
//! Watches the substrate for the ways it can go wrong: loops that keep
//! re-activating the same nodes, energy that vanishes or concentrates,
//! runaway growth, fragmentation, and mechanisms that silently stop
//! working. A critical reading produces a [`FailureRecord`] for the
//! engine to persist before it pauses.

pub mod health;
pub mod indicators;
pub mod monitor;
pub mod snapshot;

pub use health::{MechanismFailure, MechanismHealth, RunOutcome};
pub use indicators::{Indicator, Level, Reading};
pub use monitor::{FailureRecord, SafetyMonitor, SafetyReport};
pub use snapshot::SystemSnapshot;
