//! # substrate-core
//!
//! Foundation crate for the activation substrate.
//! Defines the graph model (nodes, links, entities), bitemporal rules,
//! errors, config, robust statistics, and the traits the engine is built on.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod graph;
pub mod property;
pub mod signals;
pub mod stats;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::SubstrateConfig;
pub use errors::{SubstrateError, SubstrateResult};
pub use graph::{
    Bitemporal, Confidence, Entity, EntityKind, FormationTrigger, GraphState, Link, LinkKind,
    Node, NodeContent, Record, RecordKind, Scope, StabilityState, UsefulnessLevel,
};
pub use property::{Predicate, PropertyMap, PropertyValue, StoredRecord};
pub use signals::CycleSignals;
