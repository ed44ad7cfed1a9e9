//! v001: records and record_vectors.

use rusqlite::Connection;

use substrate_core::errors::SubstrateResult;

use crate::sqlite::map_sqlite_err;

pub fn migrate(conn: &Connection) -> SubstrateResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            vid         TEXT NOT NULL UNIQUE,
            id          TEXT NOT NULL,
            kind        TEXT NOT NULL,
            type_name   TEXT NOT NULL,
            is_current  INTEGER NOT NULL,
            source_id   TEXT,
            target_id   TEXT,
            properties  TEXT NOT NULL,
            written_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_id ON records(kind, id);
        CREATE INDEX IF NOT EXISTS idx_records_current ON records(kind, is_current, type_name);
        CREATE INDEX IF NOT EXISTS idx_records_source ON records(source_id);
        CREATE INDEX IF NOT EXISTS idx_records_target ON records(target_id);

        CREATE TABLE IF NOT EXISTS record_vectors (
            vid         TEXT NOT NULL REFERENCES records(vid) ON DELETE CASCADE,
            field       TEXT NOT NULL,
            dimensions  INTEGER NOT NULL,
            data        BLOB NOT NULL,
            PRIMARY KEY (vid, field)
        );
        ",
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}
