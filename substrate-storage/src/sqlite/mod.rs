//! SQLite backend: one writer connection behind a mutex, WAL journal,
//! versioned rows keyed by `vid`, vectors as little-endian BLOBs.

mod failure_log;
pub mod migrations;
pub mod pragmas;
mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode};

use substrate_core::config::StorageConfig;
use substrate_core::errors::{StorageError, SubstrateError, SubstrateResult};
use substrate_core::traits::GraphBackend;
use substrate_core::{Predicate, RecordKind, StoredRecord};

use crate::to_storage_err;

/// Map a rusqlite error, separating "cannot reach the database" from the rest.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> SubstrateError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if matches!(
            err.code,
            ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::ReadOnly
        ) {
            return StorageError::BackendUnavailable {
                reason: e.to_string(),
            }
            .into();
        }
    }
    to_storage_err(e.to_string())
}

pub struct SqliteBackend {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (or create) a database file and migrate it.
    pub fn open(path: &Path, busy_timeout_ms: u64) -> SubstrateResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            SubstrateError::from(StorageError::BackendUnavailable {
                reason: format!("{}: {e}", path.display()),
            })
        })?;
        Self::initialize(conn, busy_timeout_ms, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> SubstrateResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_err)?;
        Self::initialize(conn, 0, None)
    }

    pub fn from_config(config: &StorageConfig) -> SubstrateResult<Self> {
        Self::open(Path::new(&config.db_path), config.busy_timeout_ms)
    }

    fn initialize(
        conn: Connection,
        busy_timeout_ms: u64,
        db_path: Option<PathBuf>,
    ) -> SubstrateResult<Self> {
        pragmas::apply_pragmas(&conn, busy_timeout_ms)?;
        let version = migrations::run_migrations(&conn)?;
        tracing::info!(
            path = ?db_path,
            schema_version = version,
            "sqlite backend ready"
        );
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> SubstrateResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            StorageError::BackendUnavailable {
                reason: "sqlite connection lock poisoned".to_string(),
            }
            .into()
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> SubstrateResult<T>
    where
        F: FnOnce(&mut Connection) -> SubstrateResult<T>,
    {
        let mut guard = self.lock()?;
        f(&mut guard)
    }
}

impl GraphBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn write_batch(&self, records: &[StoredRecord]) -> SubstrateResult<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(map_sqlite_err)?;
            for record in records {
                queries::upsert_record(&tx, record)?;
            }
            tx.commit().map_err(map_sqlite_err)?;
            Ok(())
        })
    }

    fn read_current(&self, kind: RecordKind, id: &str) -> SubstrateResult<Option<StoredRecord>> {
        self.with_conn(|conn| queries::read_current(conn, kind, id))
    }

    fn read_version(&self, vid: &str) -> SubstrateResult<Option<StoredRecord>> {
        self.with_conn(|conn| queries::read_version(conn, vid))
    }

    fn history(&self, kind: RecordKind, id: &str) -> SubstrateResult<Vec<StoredRecord>> {
        self.with_conn(|conn| queries::history(conn, kind, id))
    }

    fn scan(
        &self,
        kind: RecordKind,
        type_name: Option<&str>,
        predicate: &Predicate,
    ) -> SubstrateResult<Vec<StoredRecord>> {
        self.with_conn(|conn| queries::scan(conn, kind, type_name, predicate))
    }

    fn vector_search(
        &self,
        kind: RecordKind,
        field: &str,
        vector: &[f32],
        top_k: usize,
    ) -> SubstrateResult<Vec<(String, f64)>> {
        self.with_conn(|conn| queries::vector_search(conn, kind, field, vector, top_k))
    }
}
