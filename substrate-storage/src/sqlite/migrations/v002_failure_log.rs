//! v002: failure_log (append-only) and failure_acks.

use rusqlite::Connection;

use substrate_core::errors::SubstrateResult;

use crate::sqlite::map_sqlite_err;

pub fn migrate(conn: &Connection) -> SubstrateResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS failure_log (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            cycle       INTEGER NOT NULL,
            created_at  INTEGER NOT NULL,
            summary     TEXT NOT NULL,
            body        TEXT NOT NULL
        );

        CREATE TRIGGER IF NOT EXISTS failure_log_no_update
        BEFORE UPDATE ON failure_log
        BEGIN
            SELECT RAISE(ABORT, 'failure_log is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS failure_log_no_delete
        BEFORE DELETE ON failure_log
        BEGIN
            SELECT RAISE(ABORT, 'failure_log is append-only');
        END;

        CREATE TABLE IF NOT EXISTS failure_acks (
            record_id       TEXT PRIMARY KEY REFERENCES failure_log(id),
            acknowledged_at INTEGER NOT NULL
        );
        ",
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}
