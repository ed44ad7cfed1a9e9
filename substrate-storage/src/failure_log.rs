//! In-memory failure log for tests and ephemeral runs.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use substrate_core::errors::{SafetyError, StorageError, SubstrateResult};
use substrate_core::traits::{FailureEntry, FailureLog};

#[derive(Default)]
pub struct MemoryFailureLog {
    entries: Mutex<Vec<FailureEntry>>,
}

impl MemoryFailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> SubstrateResult<std::sync::MutexGuard<'_, Vec<FailureEntry>>> {
        self.entries.lock().map_err(|_| {
            StorageError::BackendUnavailable {
                reason: "failure log lock poisoned".to_string(),
            }
            .into()
        })
    }
}

impl FailureLog for MemoryFailureLog {
    fn append(&self, entry: &FailureEntry) -> SubstrateResult<()> {
        let mut entries = self.entries()?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StorageError::DuplicateVersion {
                vid: entry.id.clone(),
            }
            .into());
        }
        let mut stored = entry.clone();
        stored.acknowledged_at = None;
        entries.push(stored);
        Ok(())
    }

    fn list(&self) -> SubstrateResult<Vec<FailureEntry>> {
        Ok(self.entries()?.clone())
    }

    fn get(&self, id: &str) -> SubstrateResult<Option<FailureEntry>> {
        Ok(self.entries()?.iter().find(|e| e.id == id).cloned())
    }

    fn acknowledge(&self, id: &str, at: DateTime<Utc>) -> SubstrateResult<()> {
        let mut entries = self.entries()?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| SafetyError::UnknownFailureRecord {
                record_id: id.to_string(),
            })?;
        if entry.acknowledged_at.is_none() {
            entry.acknowledged_at = Some(at);
        }
        Ok(())
    }
}
