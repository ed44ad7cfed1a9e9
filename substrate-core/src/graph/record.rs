use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::enums::RecordKind;
use super::link::Link;
use super::node::Node;
use super::temporal::Bitemporal;

/// Any storable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Record {
    Node(Node),
    Link(Link),
    Entity(Entity),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Node(_) => RecordKind::Node,
            Record::Link(_) => RecordKind::Link,
            Record::Entity(_) => RecordKind::Entity,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Node(n) => &n.id,
            Record::Link(l) => &l.id,
            Record::Entity(e) => &e.id,
        }
    }

    pub fn vid(&self) -> &str {
        match self {
            Record::Node(n) => &n.vid,
            Record::Link(l) => &l.vid,
            Record::Entity(e) => &e.vid,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Record::Node(n) => n.type_name(),
            Record::Link(l) => l.type_name(),
            Record::Entity(e) => e.kind.as_str(),
        }
    }

    pub fn temporal(&self) -> &Bitemporal {
        match self {
            Record::Node(n) => &n.temporal,
            Record::Link(l) => &l.temporal,
            Record::Entity(e) => &e.temporal,
        }
    }

    pub fn temporal_mut(&mut self) -> &mut Bitemporal {
        match self {
            Record::Node(n) => &mut n.temporal,
            Record::Link(l) => &mut l.temporal,
            Record::Entity(e) => &mut e.temporal,
        }
    }

    /// Record the version that replaced this one.
    pub fn set_superseded_by(&mut self, vid: String) {
        match self {
            Record::Node(n) => n.superseded_by = Some(vid),
            Record::Link(l) => l.superseded_by = Some(vid),
            Record::Entity(e) => e.superseded_by = Some(vid),
        }
    }

    pub fn is_current(&self) -> bool {
        self.temporal().is_current()
    }
}

impl From<Node> for Record {
    fn from(n: Node) -> Self {
        Record::Node(n)
    }
}

impl From<Link> for Record {
    fn from(l: Link) -> Self {
        Record::Link(l)
    }
}

impl From<Entity> for Record {
    fn from(e: Entity) -> Self {
        Record::Entity(e)
    }
}
