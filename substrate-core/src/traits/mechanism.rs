use crate::errors::SubstrateResult;
use crate::graph::GraphState;

/// Outcome of one scheduled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MechanismStatus {
    Completed,
    /// The mechanism chose not to do its work this cycle. Counts as a missed run.
    Deferred { reason: String },
}

/// A unit of work run once per scheduled cycle against the working state.
///
/// A returned error discards everything the mechanism wrote this cycle.
pub trait Mechanism: Send {
    fn name(&self) -> &str;

    /// Run every `period` cycles.
    fn period(&self) -> u64 {
        1
    }

    fn run(&mut self, state: &mut GraphState) -> SubstrateResult<MechanismStatus>;
}
