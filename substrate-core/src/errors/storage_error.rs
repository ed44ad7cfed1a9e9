/// Backend-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("database corruption detected: {details}")]
    CorruptionDetected { details: String },

    #[error("version {vid} already written")]
    DuplicateVersion { vid: String },
}
