//! # substrate-storage
//!
//! Splits every record into primitive scalars, JSON blobs, and native
//! vectors before it reaches a backend, and reassembles it on read.
//! Ships an in-memory backend, a SQLite backend, and the append-only
//! failure log.

pub mod codec;
pub mod failure_log;
pub mod memory_backend;
pub mod sqlite;
pub mod store;
pub mod vector;

pub use codec::{decode, encode};
pub use failure_log::MemoryFailureLog;
pub use memory_backend::InMemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::{CommitSummary, GraphStore};

use substrate_core::errors::{StorageError, SubstrateError};

/// Convert a storage-layer message into a `SubstrateError`.
pub(crate) fn to_storage_err(message: impl Into<String>) -> SubstrateError {
    SubstrateError::StorageError(StorageError::SqliteError {
        message: message.into(),
    })
}
