//! A backend and a failure log that can be switched off mid-test.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use substrate_core::errors::{StorageError, SubstrateResult};
use chrono::{DateTime, Utc};

use substrate_core::traits::{FailureEntry, FailureLog, GraphBackend};
use substrate_core::{Predicate, RecordKind, StoredRecord};
use substrate_storage::{InMemoryBackend, MemoryFailureLog};

/// Delegates to an in-memory backend until told to go away, then fails
/// every call with `BackendUnavailable`.
pub struct FlakyBackend {
    inner: Arc<InMemoryBackend>,
    down: AtomicBool,
    failed_writes: AtomicUsize,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryBackend::new()),
            down: AtomicBool::new(false),
            failed_writes: AtomicUsize::new(0),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }

    /// Batches refused while down.
    pub fn failed_writes(&self) -> usize {
        self.failed_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> SubstrateResult<()> {
        unavailable_if(&self.down, "flaky backend switched off")
    }
}

fn unavailable_if(down: &AtomicBool, reason: &str) -> SubstrateResult<()> {
    if down.load(Ordering::SeqCst) {
        return Err(StorageError::BackendUnavailable {
            reason: reason.to_string(),
        }
        .into());
    }
    Ok(())
}

impl Default for FlakyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }

    fn write_batch(&self, records: &[StoredRecord]) -> SubstrateResult<()> {
        if let Err(e) = self.check() {
            self.failed_writes.fetch_add(1, Ordering::SeqCst);
            return Err(e);
        }
        self.inner.write_batch(records)
    }

    fn read_current(&self, kind: RecordKind, id: &str) -> SubstrateResult<Option<StoredRecord>> {
        self.check()?;
        self.inner.read_current(kind, id)
    }

    fn read_version(&self, vid: &str) -> SubstrateResult<Option<StoredRecord>> {
        self.check()?;
        self.inner.read_version(vid)
    }

    fn history(&self, kind: RecordKind, id: &str) -> SubstrateResult<Vec<StoredRecord>> {
        self.check()?;
        self.inner.history(kind, id)
    }

    fn scan(
        &self,
        kind: RecordKind,
        type_name: Option<&str>,
        predicate: &Predicate,
    ) -> SubstrateResult<Vec<StoredRecord>> {
        self.check()?;
        self.inner.scan(kind, type_name, predicate)
    }

    fn vector_search(
        &self,
        kind: RecordKind,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SubstrateResult<Vec<(String, f64)>> {
        self.check()?;
        self.inner.vector_search(kind, field, vector, top_k)
    }
}

/// In-memory failure log that refuses appends while down.
#[derive(Default)]
pub struct FlakyFailureLog {
    inner: MemoryFailureLog,
    down: AtomicBool,
}

impl FlakyFailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl FailureLog for FlakyFailureLog {
    fn append(&self, entry: &FailureEntry) -> SubstrateResult<()> {
        unavailable_if(&self.down, "failure log switched off")?;
        self.inner.append(entry)
    }

    fn list(&self) -> SubstrateResult<Vec<FailureEntry>> {
        self.inner.list()
    }

    fn get(&self, id: &str) -> SubstrateResult<Option<FailureEntry>> {
        self.inner.get(id)
    }

    fn acknowledge(&self, id: &str, at: DateTime<Utc>) -> SubstrateResult<()> {
        self.inner.acknowledge(id, at)
    }
}
