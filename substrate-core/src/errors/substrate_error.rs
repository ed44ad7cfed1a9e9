use super::{CodecError, MechanismError, SafetyError, StorageError, TemporalError, TraceError};

/// Convenience alias used throughout the workspace.
pub type SubstrateResult<T> = Result<T, SubstrateError>;

/// Top-level error type. Every subsystem error converts into this.
#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("codec error: {0}")]
    CodecError(#[from] CodecError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("temporal error: {0}")]
    TemporalError(#[from] TemporalError),

    #[error("mechanism error: {0}")]
    MechanismError(#[from] MechanismError),

    #[error("safety error: {0}")]
    SafetyError(#[from] SafetyError),

    #[error("trace error: {0}")]
    TraceError(#[from] TraceError),

    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SubstrateError {
    /// True when the error means the backend could not be reached at all.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            SubstrateError::StorageError(StorageError::BackendUnavailable { .. })
        )
    }
}
