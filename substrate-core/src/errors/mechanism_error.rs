/// Errors raised by a single mechanism during a cycle.
#[derive(Debug, thiserror::Error)]
pub enum MechanismError {
    #[error("mechanism `{mechanism}` failed: {reason}")]
    Failed { mechanism: String, reason: String },

    #[error("mechanism `{mechanism}` broke an invariant: {detail}")]
    InvariantViolated { mechanism: String, detail: String },
}
