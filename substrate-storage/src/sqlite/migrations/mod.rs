//! Schema migrations, applied in order and recorded in `schema_version`.

mod v001_records;
mod v002_failure_log;

use rusqlite::Connection;

use substrate_core::errors::{StorageError, SubstrateResult};

use super::map_sqlite_err;

type Migration = fn(&Connection) -> SubstrateResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_records::migrate),
    (2, v002_failure_log::migrate),
];

pub const LATEST_VERSION: u32 = 2;

pub fn current_version(conn: &Connection) -> SubstrateResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(map_sqlite_err)?;
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .map_err(map_sqlite_err)?;
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the recorded version.
pub fn run_migrations(conn: &Connection) -> SubstrateResult<u32> {
    let mut applied = current_version(conn)?;
    for (version, migrate) in MIGRATIONS {
        if *version <= applied {
            continue;
        }
        migrate(conn).map_err(|e| StorageError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        })?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )
        .map_err(map_sqlite_err)?;
        tracing::debug!(version, "applied migration");
        applied = *version;
    }
    Ok(applied)
}
