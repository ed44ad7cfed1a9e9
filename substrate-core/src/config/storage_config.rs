use serde::{Deserialize, Serialize};

use super::defaults;

/// Which backend the engine persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub db_path: String,
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            db_path: defaults::DEFAULT_DB_PATH.to_string(),
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}
