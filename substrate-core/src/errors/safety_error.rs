/// Errors surfaced by the safety layer.
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    #[error("engine is emergency-paused (failure record {record_id})")]
    EmergencyPaused { record_id: String },

    #[error("no failure record {record_id} is pending acknowledgement")]
    UnknownFailureRecord { record_id: String },
}
