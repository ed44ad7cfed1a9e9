//! Durable failure log on the same database as the graph.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use substrate_core::errors::{SafetyError, StorageError, SubstrateResult};
use substrate_core::graph::temporal::{from_millis, to_millis};
use substrate_core::traits::{FailureEntry, FailureLog};

use super::{map_sqlite_err, SqliteBackend};

const SELECT_ENTRY: &str = "SELECT f.id, f.cycle, f.created_at, f.summary, f.body, a.acknowledged_at
     FROM failure_log f
     LEFT JOIN failure_acks a ON a.record_id = f.id";

type RawEntry = (String, i64, i64, String, String, Option<i64>);

fn raw_entry(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn to_entry(raw: RawEntry) -> SubstrateResult<FailureEntry> {
    let (id, cycle, created_at, summary, body, acked) = raw;
    let time = |ms: i64| -> SubstrateResult<DateTime<Utc>> {
        from_millis(ms).ok_or_else(|| {
            StorageError::CorruptionDetected {
                details: format!("failure record {id} has timestamp {ms}"),
            }
            .into()
        })
    };
    Ok(FailureEntry {
        cycle: cycle.max(0) as u64,
        created_at: time(created_at)?,
        acknowledged_at: acked.map(time).transpose()?,
        summary,
        body: serde_json::from_str(&body)?,
        id,
    })
}

impl FailureLog for SqliteBackend {
    fn append(&self, entry: &FailureEntry) -> SubstrateResult<()> {
        let body = serde_json::to_string(&entry.body)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO failure_log (id, cycle, created_at, summary, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id,
                    i64::try_from(entry.cycle).unwrap_or(i64::MAX),
                    to_millis(entry.created_at),
                    entry.summary,
                    body,
                ],
            )
            .map_err(map_sqlite_err)?;
            Ok(())
        })
    }

    fn list(&self) -> SubstrateResult<Vec<FailureEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_ENTRY} ORDER BY f.seq"))
                .map_err(map_sqlite_err)?;
            let raws = stmt
                .query_map([], raw_entry)
                .map_err(map_sqlite_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sqlite_err)?;
            raws.into_iter().map(to_entry).collect()
        })
    }

    fn get(&self, id: &str) -> SubstrateResult<Option<FailureEntry>> {
        self.with_conn(|conn| {
            let raw = conn
                .query_row(&format!("{SELECT_ENTRY} WHERE f.id = ?1"), [id], raw_entry)
                .optional()
                .map_err(map_sqlite_err)?;
            raw.map(to_entry).transpose()
        })
    }

    fn acknowledge(&self, id: &str, at: DateTime<Utc>) -> SubstrateResult<()> {
        self.with_conn(|conn| {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM failure_log WHERE id = ?1)",
                    [id],
                    |row| row.get(0),
                )
                .map_err(map_sqlite_err)?;
            if !exists {
                return Err(SafetyError::UnknownFailureRecord {
                    record_id: id.to_string(),
                }
                .into());
            }
            // First acknowledgement wins.
            conn.execute(
                "INSERT OR IGNORE INTO failure_acks (record_id, acknowledged_at) VALUES (?1, ?2)",
                params![id, to_millis(at)],
            )
            .map_err(map_sqlite_err)?;
            Ok(())
        })
    }
}
