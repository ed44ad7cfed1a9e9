//! The graph model: nodes, links, entities, and the per-cycle state holding them.

mod confidence;
mod content;
mod entity;
mod enums;
mod link;
mod node;
mod record;
mod state;
pub mod temporal;
mod usage;

pub use confidence::Confidence;
pub use content::{LinkKind, NodeContent};
pub use entity::Entity;
pub use enums::{
    EntityKind, FormationTrigger, RecordKind, Scope, StabilityState, UsefulnessLevel,
};
pub use link::Link;
pub use node::{EntityActivation, Node};
pub use record::Record;
pub use state::GraphState;
pub use temporal::Bitemporal;
pub use usage::{EntityStats, LinkStats, NodeStats};
