//! # substrate-learning
//!
//! Online reinforcement of node and link importance. Usage signals from a
//! cycle (marks, working-memory presence, formation quality, gap closure,
//! flow) are smoothed into EMAs, ranked within each record's cohort, and
//! turned into `log_weight` updates with a per-record adaptive rate.
//!
//! Trace text is parsed here too: usage marks feed the signals, formation
//! blocks become new or superseding records.

pub mod cohort;
pub mod formation;
pub mod mechanism;
pub mod trace;
pub mod weights;

pub use formation::{apply_formations, FormationOutcome};
pub use mechanism::LearningMechanism;
pub use trace::{parse_trace, LinkFormation, NodeFormation, ParsedTrace, UsageMark};
pub use weights::{update_link_weights, update_node_weights, WeightUpdate};
