use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SubstrateResult;

/// One durable post-mortem entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub id: String,
    pub cycle: u64,
    pub created_at: DateTime<Utc>,
    /// One-line "why did it stop".
    pub summary: String,
    /// Full record as JSON: snapshots, readings, failures.
    pub body: serde_json::Value,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// Append-only log of emergency pauses.
pub trait FailureLog: Send + Sync {
    fn append(&self, entry: &FailureEntry) -> SubstrateResult<()>;

    /// All entries, oldest first.
    fn list(&self) -> SubstrateResult<Vec<FailureEntry>>;

    fn get(&self, id: &str) -> SubstrateResult<Option<FailureEntry>>;

    /// Stamp an operator acknowledgement. The entry itself is never rewritten.
    fn acknowledge(&self, id: &str, at: DateTime<Utc>) -> SubstrateResult<()>;
}
