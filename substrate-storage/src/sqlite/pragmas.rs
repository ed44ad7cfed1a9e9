//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode, NORMAL sync, configurable busy_timeout, foreign_keys ON.

use rusqlite::Connection;

use substrate_core::errors::SubstrateResult;

use super::map_sqlite_err;

pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u64) -> SubstrateResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -16000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// True when the connection is in WAL mode. In-memory databases never are.
pub fn verify_wal_mode(conn: &Connection) -> SubstrateResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(map_sqlite_err)?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
