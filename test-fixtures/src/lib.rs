//! Synthetic graphs and test doubles shared by the substrate crates' tests.
//!
//! Everything here panics on misuse; it is only ever linked into tests and
//! benches.

pub mod backends;
pub mod graphs;
pub mod mechanisms;
pub mod sinks;

pub use backends::{FlakyBackend, FlakyFailureLog};
pub use graphs::{add_entities, concept_node, isolated_graph, ring_graph, seeded_graph};
pub use mechanisms::{DeferringMechanism, FailingMechanism, NodeSpawningMechanism};
pub use sinks::RecordingSink;
