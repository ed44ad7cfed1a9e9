//! `GraphStore`: typed records in, validated property maps out.
//!
//! Every write is encoded and validated in full before the backend is
//! called, so a bad record never produces a partial write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use substrate_core::constants::{VECTOR_CENTROID, VECTOR_EMBEDDING};
use substrate_core::errors::{CodecError, SubstrateError, SubstrateResult};
use substrate_core::traits::GraphBackend;
use substrate_core::{
    Entity, GraphState, Link, Node, Predicate, PropertyMap, PropertyValue, Record, RecordKind,
    StoredRecord,
};

use crate::codec::{decode, encode};

/// What a commit wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Versions that did not exist before the cycle.
    pub created: usize,
    /// Existing versions rewritten in place.
    pub updated: usize,
    /// Versions expired this cycle.
    pub retired: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.retired
    }
}

#[derive(Clone)]
pub struct GraphStore {
    backend: Arc<dyn GraphBackend>,
}

impl GraphStore {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    /// Create a record, or update it. A record whose logical id already has a
    /// different current version supersedes that version.
    pub fn put(&self, record: &Record) -> SubstrateResult<()> {
        let stored = encode(record)?;
        if let Some(current) = self.backend.read_current(record.kind(), record.id())? {
            if current.vid != record.vid() {
                self.supersede(record.clone())?;
                return Ok(());
            }
        }
        self.backend.write_batch(&[stored])
    }

    /// Write several records as one atomic batch.
    pub fn put_all(&self, records: &[Record]) -> SubstrateResult<usize> {
        let batch = records.iter().map(encode).collect::<SubstrateResult<Vec<_>>>()?;
        self.backend.write_batch(&batch)?;
        Ok(batch.len())
    }

    /// Write an externally produced flat property map.
    ///
    /// The map is checked for nested values before the backend is touched.
    /// Returns the version id written.
    pub fn put_raw(
        &self,
        kind: RecordKind,
        id: &str,
        type_name: &str,
        map: &Map<String, Value>,
    ) -> SubstrateResult<String> {
        let properties = PropertyMap::from_json(map)?;
        properties.validate()?;
        let vid = properties
            .get("vid")
            .and_then(PropertyValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let text = |key: &str| properties.get(key).and_then(PropertyValue::as_str).map(str::to_string);
        let stored = StoredRecord {
            kind,
            id: id.to_string(),
            type_name: type_name.to_string(),
            current: properties.get("expired_at").map_or(true, PropertyValue::is_null),
            source: text("source"),
            target: text("target"),
            vid: vid.clone(),
            properties,
        };
        self.backend.write_batch(&[stored])?;
        Ok(vid)
    }

    pub fn get(&self, kind: RecordKind, id: &str) -> SubstrateResult<Option<Record>> {
        self.backend
            .read_current(kind, id)?
            .map(|s| decode(&s))
            .transpose()
    }

    pub fn get_node(&self, id: &str) -> SubstrateResult<Option<Node>> {
        Ok(match self.get(RecordKind::Node, id)? {
            Some(Record::Node(n)) => Some(n),
            _ => None,
        })
    }

    pub fn get_link(&self, id: &str) -> SubstrateResult<Option<Link>> {
        Ok(match self.get(RecordKind::Link, id)? {
            Some(Record::Link(l)) => Some(l),
            _ => None,
        })
    }

    pub fn get_entity(&self, id: &str) -> SubstrateResult<Option<Entity>> {
        Ok(match self.get(RecordKind::Entity, id)? {
            Some(Record::Entity(e)) => Some(e),
            _ => None,
        })
    }

    pub fn get_version(&self, vid: &str) -> SubstrateResult<Option<Record>> {
        self.backend
            .read_version(vid)?
            .map(|s| decode(&s))
            .transpose()
    }

    /// Every version of a logical id, oldest first.
    pub fn history(&self, kind: RecordKind, id: &str) -> SubstrateResult<Vec<Record>> {
        self.backend
            .history(kind, id)?
            .iter()
            .map(decode)
            .collect()
    }

    pub fn query_by_type(
        &self,
        kind: RecordKind,
        type_name: Option<&str>,
        predicate: &Predicate,
    ) -> SubstrateResult<Vec<Record>> {
        self.backend
            .scan(kind, type_name, predicate)?
            .iter()
            .map(decode)
            .collect()
    }

    /// Nodes by embedding, entities by centroid. Best first.
    pub fn query_by_vector_similarity(
        &self,
        kind: RecordKind,
        vector: &[f32],
        top_k: usize,
    ) -> SubstrateResult<Vec<(Record, f64)>> {
        let field = match kind {
            RecordKind::Node => VECTOR_EMBEDDING,
            RecordKind::Entity => VECTOR_CENTROID,
            RecordKind::Link => {
                return Err(CodecError::UnknownType {
                    kind: "vector field".to_string(),
                    type_name: "link".to_string(),
                }
                .into())
            }
        };
        let hits = self.backend.vector_search(kind, field, vector, top_k)?;
        let mut results = Vec::with_capacity(hits.len());
        for (id, similarity) in hits {
            if let Some(record) = self.get(kind, &id)? {
                results.push((record, similarity));
            }
        }
        Ok(results)
    }

    /// Make `next` the current version of its logical id. The previous
    /// current version is expired at `next`'s creation time and the two are
    /// linked. Both writes land in one batch. Returns the expired version.
    pub fn supersede(&self, mut next: Record) -> SubstrateResult<Record> {
        let stored = self
            .backend
            .read_current(next.kind(), next.id())?
            .ok_or_else(|| SubstrateError::NotFound {
                id: next.id().to_string(),
            })?;
        let mut previous = decode(&stored)?;
        previous
            .temporal_mut()
            .expire(next.temporal().created_at)?;
        previous.set_superseded_by(next.vid().to_string());
        set_supersedes(&mut next, previous.vid().to_string());

        let batch = vec![encode(&previous)?, encode(&next)?];
        self.backend.write_batch(&batch)?;
        tracing::debug!(
            id = next.id(),
            from = previous.vid(),
            to = next.vid(),
            "superseded version"
        );
        Ok(previous)
    }

    /// All current records as a working state.
    pub fn load_state(&self, now: DateTime<Utc>) -> SubstrateResult<GraphState> {
        let mut records = Vec::new();
        for kind in RecordKind::ALL {
            for stored in self.backend.scan(*kind, None, &Predicate::All)? {
                records.push(decode(&stored)?);
            }
        }
        GraphState::from_records(records, now)
    }

    /// Persist everything that changed between two states of one cycle,
    /// plus the versions the cycle retired, as a single atomic batch.
    pub fn commit(&self, before: &GraphState, after: &GraphState) -> SubstrateResult<CommitSummary> {
        let mut summary = CommitSummary::default();
        let mut batch = Vec::new();

        for record in after.records() {
            match previous_of(before, &record) {
                Some(prev) if prev == record => continue,
                Some(_) => summary.updated += 1,
                None => summary.created += 1,
            }
            batch.push(encode(&record)?);
        }
        for record in after.retired() {
            summary.retired += 1;
            batch.push(encode(record)?);
        }

        if !batch.is_empty() {
            self.backend.write_batch(&batch)?;
        }
        Ok(summary)
    }
}

/// The same version as it stood in `before`, if it existed there.
fn previous_of(before: &GraphState, record: &Record) -> Option<Record> {
    let prev = match record {
        Record::Node(n) => before.node(&n.id).cloned().map(Record::Node),
        Record::Link(l) => before.link(&l.id).cloned().map(Record::Link),
        Record::Entity(e) => before.entity(&e.id).cloned().map(Record::Entity),
    }?;
    (prev.vid() == record.vid()).then_some(prev)
}

fn set_supersedes(record: &mut Record, vid: String) {
    match record {
        Record::Node(n) => n.supersedes = Some(vid),
        Record::Link(l) => l.supersedes = Some(vid),
        Record::Entity(e) => e.supersedes = Some(vid),
    }
}
