use crate::errors::SubstrateResult;
use crate::graph::RecordKind;
use crate::property::{Predicate, StoredRecord};

/// The narrow port to the graph database of record.
///
/// Implementations only ever see validated, flat property maps.
pub trait GraphBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Insert or replace versions by `vid`. All-or-nothing.
    fn write_batch(&self, records: &[StoredRecord]) -> SubstrateResult<()>;

    /// Current version of a logical id.
    fn read_current(&self, kind: RecordKind, id: &str) -> SubstrateResult<Option<StoredRecord>>;

    /// A specific version.
    fn read_version(&self, vid: &str) -> SubstrateResult<Option<StoredRecord>>;

    /// Every version of a logical id, oldest first.
    fn history(&self, kind: RecordKind, id: &str) -> SubstrateResult<Vec<StoredRecord>>;

    /// Current versions of a kind, optionally of one type, matching `predicate`.
    fn scan(
        &self,
        kind: RecordKind,
        type_name: Option<&str>,
        predicate: &Predicate,
    ) -> SubstrateResult<Vec<StoredRecord>>;

    /// `(id, cosine similarity)` of the `top_k` current records whose
    /// vector `field` is closest to `vector`, best first.
    fn vector_search(
        &self,
        kind: RecordKind,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SubstrateResult<Vec<(String, f64)>>;
}
