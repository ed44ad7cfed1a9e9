//! Record ↔ property-map codec.
//!
//! Each record is split into three storage classes: primitive scalars
//! (timestamps as epoch milliseconds, enums as strings), JSON blobs for
//! map-valued fields, and native vectors. Type-specific content is mapped
//! by an exhaustive match per kind.

mod entity_codec;
mod fields;
mod link_codec;
mod node_codec;

use substrate_core::errors::SubstrateResult;
use substrate_core::{Record, RecordKind, StoredRecord};

/// Encode and validate a record. Fails before any backend is touched.
pub fn encode(record: &Record) -> SubstrateResult<StoredRecord> {
    let stored = match record {
        Record::Node(n) => node_codec::encode_node(n)?,
        Record::Link(l) => link_codec::encode_link(l)?,
        Record::Entity(e) => entity_codec::encode_entity(e)?,
    };
    stored.properties.validate()?;
    Ok(stored)
}

pub fn decode(stored: &StoredRecord) -> SubstrateResult<Record> {
    Ok(match stored.kind {
        RecordKind::Node => Record::Node(node_codec::decode_node(stored)?),
        RecordKind::Link => Record::Link(link_codec::decode_link(stored)?),
        RecordKind::Entity => Record::Entity(entity_codec::decode_entity(stored)?),
    })
}
