//! # substrate-activation
//!
//! Everything that moves node energy: cohort thresholds, the active set and
//! its frontier, two-scale strides guided by entity valence, working-memory
//! selection, type-dependent decay, entity energy aggregation, and stimulus
//! injection. Each per-cycle stage is exposed as a [`Mechanism`].
//!
//! [`Mechanism`]: substrate_core::traits::Mechanism

pub mod active_set;
pub mod decay;
pub mod entity_energy;
pub mod ledger;
pub mod mechanisms;
pub mod stimulus;
pub mod threshold;
pub mod traversal;
pub mod valence;
pub mod working_memory;

pub use active_set::{active_nodes, frontier, neighborhood};
pub use ledger::EnergyLedger;
pub use mechanisms::{ActivationMechanism, DecayMechanism, EntityAggregationMechanism};
