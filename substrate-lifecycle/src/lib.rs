//! # substrate-lifecycle
//!
//! Entities earn their keep. Each cycle their five EMAs are refreshed from
//! the cycle's signals, folded into a quality score, and compared against
//! the rest of the non-functional cohort. Sustained outliers are promoted
//! or dissolved. Functional entities are curated and never evaluated.

pub mod emas;
pub mod initialize;
pub mod mechanism;
pub mod quality;
pub mod transitions;

pub use emas::update_entity_emas;
pub use initialize::{initialize_entity, register_entity};
pub use mechanism::LifecycleMechanism;
pub use quality::entity_quality;
pub use transitions::evaluate_transitions;
