use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::entity::Entity;
use super::link::Link;
use super::node::Node;
use super::record::Record;
use super::temporal::truncate_millis;
use crate::errors::{SubstrateError, SubstrateResult, TemporalError};
use crate::signals::CycleSignals;

/// The working view of the graph for one cycle: current versions only,
/// with adjacency indexes. Versions retired during the cycle are kept
/// aside until the cycle commits.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub cycle: u64,
    pub now: DateTime<Utc>,
    nodes: BTreeMap<String, Node>,
    links: BTreeMap<String, Link>,
    entities: BTreeMap<String, Entity>,
    outgoing: BTreeMap<String, BTreeSet<String>>,
    incoming: BTreeMap<String, BTreeSet<String>>,
    retired: Vec<Record>,
    /// Current goal direction, set by goal stimuli.
    pub goal: Option<Vec<f32>>,
    /// Per-cycle scratch shared between mechanisms.
    pub signals: CycleSignals,
}

impl GraphState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: truncate_millis(now),
            ..Self::default()
        }
    }

    /// Build from stored records. Non-current versions are skipped;
    /// links whose endpoints are missing are rejected.
    pub fn from_records(
        records: impl IntoIterator<Item = Record>,
        now: DateTime<Utc>,
    ) -> SubstrateResult<Self> {
        let mut state = Self::new(now);
        let mut links = Vec::new();
        for record in records {
            if !record.is_current() {
                continue;
            }
            match record {
                Record::Node(n) => state.insert_node(n)?,
                Record::Entity(e) => state.insert_entity(e)?,
                Record::Link(l) => links.push(l),
            }
        }
        for link in links {
            state.insert_link(link)?;
        }
        Ok(state)
    }

    /// Start a new cycle: advance the clock and clear the scratch signals.
    pub fn begin_cycle(&mut self, cycle: u64, now: DateTime<Utc>, dt_seconds: f64) {
        self.cycle = cycle;
        self.now = truncate_millis(now);
        self.signals = CycleSignals::new(dt_seconds);
    }

    // ---- nodes ----

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Add a brand-new node. Use [`GraphState::supersede_node`] to replace one.
    pub fn insert_node(&mut self, node: Node) -> SubstrateResult<()> {
        if !node.temporal.is_current() {
            return Err(TemporalError::NotCurrent { id: node.id }.into());
        }
        if self.nodes.contains_key(&node.id) {
            return Err(SubstrateError::InvalidRecord {
                id: node.id,
                reason: "a current version already exists".to_string(),
            });
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Replace the current version of a node with `next`, expiring the old one.
    pub fn supersede_node(&mut self, mut next: Node) -> SubstrateResult<()> {
        let current = self
            .nodes
            .get(&next.id)
            .ok_or_else(|| SubstrateError::NotFound { id: next.id.clone() })?;
        let mut old = current.clone();
        old.temporal.expire(next.temporal.created_at)?;
        old.superseded_by = Some(next.vid.clone());
        next.supersedes = Some(old.vid.clone());
        self.retired.push(Record::Node(old));
        self.nodes.insert(next.id.clone(), next);
        Ok(())
    }

    // ---- links ----

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn link_mut(&mut self, id: &str) -> Option<&mut Link> {
        self.links.get_mut(id)
    }

    /// Every current link, including ones whose valid time has closed.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.values_mut()
    }

    /// Current links valid at `now`.
    pub fn live_links(&self) -> impl Iterator<Item = &Link> {
        let now = self.now;
        self.links.values().filter(move |l| l.is_live_at(now))
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Add a brand-new link. Both endpoints must be current nodes.
    pub fn insert_link(&mut self, link: Link) -> SubstrateResult<()> {
        if !link.temporal.is_current() {
            return Err(TemporalError::NotCurrent { id: link.id }.into());
        }
        for endpoint in [&link.source, &link.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(SubstrateError::NotFound {
                    id: endpoint.clone(),
                });
            }
        }
        if self.links.contains_key(&link.id) {
            return Err(SubstrateError::InvalidRecord {
                id: link.id,
                reason: "a current version already exists".to_string(),
            });
        }
        self.index_link(&link);
        self.links.insert(link.id.clone(), link);
        Ok(())
    }

    /// Replace the current version of a link with `next`, expiring the old one.
    pub fn supersede_link(&mut self, mut next: Link) -> SubstrateResult<()> {
        let current = self
            .links
            .get(&next.id)
            .ok_or_else(|| SubstrateError::NotFound { id: next.id.clone() })?;
        let mut old = current.clone();
        old.temporal.expire(next.temporal.created_at)?;
        old.superseded_by = Some(next.vid.clone());
        next.supersedes = Some(old.vid.clone());
        self.unindex_link(&old);
        self.retired.push(Record::Link(old));
        self.index_link(&next);
        self.links.insert(next.id.clone(), next);
        Ok(())
    }

    /// Retire a link from the current view. History keeps it.
    pub fn expire_link(&mut self, id: &str, at: DateTime<Utc>) -> SubstrateResult<()> {
        let current = self
            .links
            .get(id)
            .ok_or_else(|| SubstrateError::NotFound { id: id.to_string() })?;
        let mut old = current.clone();
        old.temporal.expire(at)?;
        self.links.remove(id);
        self.unindex_link(&old);
        self.retired.push(Record::Link(old));
        Ok(())
    }

    /// Mark a link as no longer true in the world. It stays current.
    pub fn invalidate_link(&mut self, id: &str, at: DateTime<Utc>) -> SubstrateResult<()> {
        let link = self
            .links
            .get_mut(id)
            .ok_or_else(|| SubstrateError::NotFound { id: id.to_string() })?;
        link.temporal.invalidate(at)?;
        Ok(())
    }

    /// Live links leaving `node_id`.
    pub fn outgoing_links<'a>(&'a self, node_id: &str) -> impl Iterator<Item = &'a Link> + 'a {
        let now = self.now;
        self.outgoing
            .get(node_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.links.get(id))
            .filter(move |l| l.is_live_at(now))
    }

    /// Live links entering `node_id`.
    pub fn incoming_links<'a>(&'a self, node_id: &str) -> impl Iterator<Item = &'a Link> + 'a {
        let now = self.now;
        self.incoming
            .get(node_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.links.get(id))
            .filter(move |l| l.is_live_at(now))
    }

    /// Live in-degree plus out-degree.
    pub fn degree(&self, node_id: &str) -> usize {
        self.outgoing_links(node_id).count() + self.incoming_links(node_id).count()
    }

    fn index_link(&mut self, link: &Link) {
        self.outgoing
            .entry(link.source.clone())
            .or_default()
            .insert(link.id.clone());
        self.incoming
            .entry(link.target.clone())
            .or_default()
            .insert(link.id.clone());
    }

    fn unindex_link(&mut self, link: &Link) {
        if let Some(ids) = self.outgoing.get_mut(&link.source) {
            ids.remove(&link.id);
        }
        if let Some(ids) = self.incoming.get_mut(&link.target) {
            ids.remove(&link.id);
        }
    }

    // ---- entities ----

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn insert_entity(&mut self, entity: Entity) -> SubstrateResult<()> {
        if !entity.temporal.is_current() {
            return Err(TemporalError::NotCurrent { id: entity.id }.into());
        }
        if self.entities.contains_key(&entity.id) {
            return Err(SubstrateError::InvalidRecord {
                id: entity.id,
                reason: "a current version already exists".to_string(),
            });
        }
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Entities (not dissolved) that list `node_id` as a member.
    pub fn entities_containing<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .values()
            .filter(move |e| !e.is_dissolved() && e.members.contains_key(node_id))
    }

    /// The active entity with the most energy. Ties go to the smaller id.
    pub fn dominant_entity(&self) -> Option<&str> {
        let mut best: Option<&Entity> = None;
        for entity in self.entities.values() {
            if entity.is_dissolved() || !entity.is_active() {
                continue;
            }
            if best.map_or(true, |b| entity.energy > b.energy) {
                best = Some(entity);
            }
        }
        best.map(|e| e.id.as_str())
    }

    // ---- whole-graph ----

    pub fn total_energy(&self) -> f64 {
        self.nodes.values().map(|n| n.energy).sum()
    }

    /// Versions retired this cycle, not yet committed.
    pub fn retired(&self) -> &[Record] {
        &self.retired
    }

    pub fn take_retired(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.retired)
    }

    /// All current records.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.nodes
            .values()
            .cloned()
            .map(Record::Node)
            .chain(self.links.values().cloned().map(Record::Link))
            .chain(self.entities.values().cloned().map(Record::Entity))
    }
}
