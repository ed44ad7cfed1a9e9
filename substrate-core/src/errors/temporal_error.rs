use chrono::{DateTime, Utc};

/// Bitemporal rule violations.
#[derive(Debug, thiserror::Error)]
pub enum TemporalError {
    #[error("`{field}` is already set and cannot change")]
    AlreadySet { field: &'static str },

    #[error("`{field}` at {at} would precede its lower bound {bound}")]
    Regression {
        field: &'static str,
        at: DateTime<Utc>,
        bound: DateTime<Utc>,
    },

    #[error("record {id} is not the current version")]
    NotCurrent { id: String },
}
