//! In-process backend. Same contract as SQLite, no durability.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use substrate_core::errors::{StorageError, SubstrateResult};
use substrate_core::stats::cosine_similarity;
use substrate_core::traits::GraphBackend;
use substrate_core::{Predicate, RecordKind, StoredRecord};

#[derive(Default)]
struct Tables {
    /// vid → (first-write sequence, record).
    versions: BTreeMap<String, (u64, StoredRecord)>,
    /// (kind, id) → vids in write order.
    by_id: BTreeMap<(RecordKind, String), Vec<String>>,
    next_seq: u64,
}

/// Versions keyed by `vid` behind a lock.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trait calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of stored versions.
    pub fn version_count(&self) -> usize {
        self.read().map(|t| t.versions.len()).unwrap_or(0)
    }

    fn read(&self) -> SubstrateResult<RwLockReadGuard<'_, Tables>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables.read().map_err(|_| poisoned())
    }

    fn write(&self) -> SubstrateResult<RwLockWriteGuard<'_, Tables>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> substrate_core::SubstrateError {
    StorageError::BackendUnavailable {
        reason: "in-memory backend lock poisoned".to_string(),
    }
    .into()
}

impl GraphBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_batch(&self, records: &[StoredRecord]) -> SubstrateResult<()> {
        let mut tables = self.write()?;
        // Validation happened upstream, so nothing below can fail halfway.
        for record in records {
            let seq = match tables.versions.get(&record.vid) {
                Some((seq, _)) => *seq,
                None => {
                    let seq = tables.next_seq;
                    tables.next_seq += 1;
                    tables
                        .by_id
                        .entry((record.kind, record.id.clone()))
                        .or_default()
                        .push(record.vid.clone());
                    seq
                }
            };
            tables
                .versions
                .insert(record.vid.clone(), (seq, record.clone()));
        }
        Ok(())
    }

    fn read_current(&self, kind: RecordKind, id: &str) -> SubstrateResult<Option<StoredRecord>> {
        let tables = self.read()?;
        let found = tables
            .by_id
            .get(&(kind, id.to_string()))
            .into_iter()
            .flatten()
            .filter_map(|vid| tables.versions.get(vid))
            .map(|(_, r)| r)
            .find(|r| r.current)
            .cloned();
        Ok(found)
    }

    fn read_version(&self, vid: &str) -> SubstrateResult<Option<StoredRecord>> {
        let tables = self.read()?;
        Ok(tables.versions.get(vid).map(|(_, r)| r.clone()))
    }

    fn history(&self, kind: RecordKind, id: &str) -> SubstrateResult<Vec<StoredRecord>> {
        let tables = self.read()?;
        let mut versions: Vec<&(u64, StoredRecord)> = tables
            .by_id
            .get(&(kind, id.to_string()))
            .into_iter()
            .flatten()
            .filter_map(|vid| tables.versions.get(vid))
            .collect();
        versions.sort_by_key(|(seq, _)| *seq);
        Ok(versions.into_iter().map(|(_, r)| r.clone()).collect())
    }

    fn scan(
        &self,
        kind: RecordKind,
        type_name: Option<&str>,
        predicate: &Predicate,
    ) -> SubstrateResult<Vec<StoredRecord>> {
        let tables = self.read()?;
        let mut hits: Vec<&(u64, StoredRecord)> = tables
            .versions
            .values()
            .filter(|(_, r)| r.kind == kind && r.current)
            .filter(|(_, r)| type_name.map_or(true, |t| r.type_name == t))
            .filter(|(_, r)| predicate.matches(&r.properties))
            .collect();
        hits.sort_by(|a, b| a.1.id.cmp(&b.1.id));
        Ok(hits.into_iter().map(|(_, r)| r.clone()).collect())
    }

    fn vector_search(
        &self,
        kind: RecordKind,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SubstrateResult<Vec<(String, f64)>> {
        let tables = self.read()?;
        let mut scored: Vec<(String, f64)> = tables
            .versions
            .values()
            .filter(|(_, r)| r.kind == kind && r.current)
            .filter_map(|(_, r)| {
                let stored = r.properties.get(field)?.as_vector()?;
                if stored.len() != vector.len() {
                    return None;
                }
                Some((r.id.clone(), cosine_similarity(vector, &stored)))
            })
            .collect();
        sort_by_similarity(&mut scored);
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Best first; ties by id so results are stable.
pub(crate) fn sort_by_similarity(scored: &mut [(String, f64)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}
