//! Row-level SQL for the `records` and `record_vectors` tables.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use substrate_core::errors::{StorageError, SubstrateResult};
use substrate_core::graph::temporal::now_millis;
use substrate_core::stats::cosine_similarity;
use substrate_core::{Predicate, PropertyMap, PropertyValue, RecordKind, StoredRecord};

use super::map_sqlite_err;
use crate::memory_backend::sort_by_similarity;
use crate::vector::{bytes_to_f32_vec, f32_vec_to_bytes};

const SELECT_COLUMNS: &str =
    "SELECT vid, id, kind, type_name, is_current, source_id, target_id, properties FROM records";

/// Insert a version, or overwrite it in place when the `vid` exists.
pub fn upsert_record(conn: &Connection, record: &StoredRecord) -> SubstrateResult<()> {
    let mut scalars = serde_json::Map::new();
    let mut vectors = Vec::new();
    for (key, value) in record.properties.iter() {
        match value {
            PropertyValue::Vector(v) => vectors.push((key.as_str(), v)),
            other => {
                scalars.insert(key.clone(), other.to_json());
            }
        }
    }
    let properties = serde_json::to_string(&scalars)?;

    conn.execute(
        "INSERT INTO records
            (vid, id, kind, type_name, is_current, source_id, target_id, properties, written_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(vid) DO UPDATE SET
            is_current = excluded.is_current,
            properties = excluded.properties,
            written_at = excluded.written_at",
        params![
            record.vid,
            record.id,
            record.kind.as_str(),
            record.type_name,
            record.current,
            record.source,
            record.target,
            properties,
            now_millis().timestamp_millis(),
        ],
    )
    .map_err(map_sqlite_err)?;

    conn.execute("DELETE FROM record_vectors WHERE vid = ?1", [&record.vid])
        .map_err(map_sqlite_err)?;
    for (field, vector) in vectors {
        conn.execute(
            "INSERT INTO record_vectors (vid, field, dimensions, data) VALUES (?1, ?2, ?3, ?4)",
            params![record.vid, field, vector.len() as i64, f32_vec_to_bytes(vector)],
        )
        .map_err(map_sqlite_err)?;
    }
    Ok(())
}

struct RawRow {
    vid: String,
    id: String,
    kind: String,
    type_name: String,
    current: bool,
    source: Option<String>,
    target: Option<String>,
    properties: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        vid: row.get(0)?,
        id: row.get(1)?,
        kind: row.get(2)?,
        type_name: row.get(3)?,
        current: row.get(4)?,
        source: row.get(5)?,
        target: row.get(6)?,
        properties: row.get(7)?,
    })
}

fn corrupt(details: String) -> substrate_core::SubstrateError {
    StorageError::CorruptionDetected { details }.into()
}

fn hydrate(conn: &Connection, raw: RawRow) -> SubstrateResult<StoredRecord> {
    let kind = RecordKind::parse(&raw.kind)
        .ok_or_else(|| corrupt(format!("record {} has unknown kind `{}`", raw.vid, raw.kind)))?;
    let json: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw.properties)?;
    let mut properties = PropertyMap::from_json(&json)?;

    let mut stmt = conn
        .prepare_cached("SELECT field, dimensions, data FROM record_vectors WHERE vid = ?1")
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map([&raw.vid], |row| {
            let field: String = row.get(0)?;
            let dims: i64 = row.get(1)?;
            let data: Vec<u8> = row.get(2)?;
            Ok((field, dims, data))
        })
        .map_err(map_sqlite_err)?;
    for row in rows {
        let (field, dims, data) = row.map_err(map_sqlite_err)?;
        let vector = bytes_to_f32_vec(&data);
        if vector.len() as i64 != dims {
            return Err(corrupt(format!(
                "vector {field} of {} has {} floats, expected {dims}",
                raw.vid,
                vector.len()
            )));
        }
        properties.insert(field, PropertyValue::Vector(vector));
    }

    Ok(StoredRecord {
        kind,
        id: raw.id,
        vid: raw.vid,
        type_name: raw.type_name,
        current: raw.current,
        source: raw.source,
        target: raw.target,
        properties,
    })
}

fn query_records(
    conn: &Connection,
    sql: &str,
    args: Vec<SqlValue>,
) -> SubstrateResult<Vec<StoredRecord>> {
    let raws: Vec<RawRow> = {
        let mut stmt = conn.prepare(sql).map_err(map_sqlite_err)?;
        let rows = stmt
            .query_map(params_from_iter(args), raw_row)
            .map_err(map_sqlite_err)?;
        rows.collect::<rusqlite::Result<_>>()
            .map_err(map_sqlite_err)?
    };
    raws.into_iter().map(|raw| hydrate(conn, raw)).collect()
}

pub fn read_current(
    conn: &Connection,
    kind: RecordKind,
    id: &str,
) -> SubstrateResult<Option<StoredRecord>> {
    let sql = format!("{SELECT_COLUMNS} WHERE kind = ?1 AND id = ?2 AND is_current = 1 LIMIT 1");
    let raw = conn
        .query_row(&sql, params![kind.as_str(), id], raw_row)
        .optional()
        .map_err(map_sqlite_err)?;
    raw.map(|r| hydrate(conn, r)).transpose()
}

pub fn read_version(conn: &Connection, vid: &str) -> SubstrateResult<Option<StoredRecord>> {
    let sql = format!("{SELECT_COLUMNS} WHERE vid = ?1");
    let raw = conn
        .query_row(&sql, [vid], raw_row)
        .optional()
        .map_err(map_sqlite_err)?;
    raw.map(|r| hydrate(conn, r)).transpose()
}

pub fn history(conn: &Connection, kind: RecordKind, id: &str) -> SubstrateResult<Vec<StoredRecord>> {
    let sql = format!("{SELECT_COLUMNS} WHERE kind = ?1 AND id = ?2 ORDER BY seq");
    query_records(
        conn,
        &sql,
        vec![
            SqlValue::Text(kind.as_str().to_string()),
            SqlValue::Text(id.to_string()),
        ],
    )
}

/// Current records of a kind. Predicates that translate to SQL are pushed
/// into the query as a prefilter; every row is re-checked in Rust.
pub fn scan(
    conn: &Connection,
    kind: RecordKind,
    type_name: Option<&str>,
    predicate: &Predicate,
) -> SubstrateResult<Vec<StoredRecord>> {
    let mut sql = format!("{SELECT_COLUMNS} WHERE kind = ? AND is_current = 1");
    let mut args = vec![SqlValue::Text(kind.as_str().to_string())];
    if let Some(t) = type_name {
        sql.push_str(" AND type_name = ?");
        args.push(SqlValue::Text(t.to_string()));
    }
    if let Some((clause, extra)) = push_down(predicate) {
        sql.push_str(" AND ");
        sql.push_str(&clause);
        args.extend(extra);
    }
    sql.push_str(" ORDER BY id");

    let records = query_records(conn, &sql, args)?;
    Ok(records
        .into_iter()
        .filter(|r| predicate.matches(&r.properties))
        .collect())
}

fn json_path(field: &str) -> Option<String> {
    let simple = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    simple.then(|| format!("json_extract(properties, '$.{field}')"))
}

fn scalar(value: &PropertyValue) -> Option<SqlValue> {
    match value {
        PropertyValue::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        PropertyValue::Int(i) => Some(SqlValue::Integer(*i)),
        PropertyValue::Float(f) if f.is_finite() => Some(SqlValue::Real(*f)),
        PropertyValue::Text(s) => Some(SqlValue::Text(s.clone())),
        _ => None,
    }
}

/// SQL fragment that admits at least every row `predicate` matches.
/// `None` when nothing useful can be pushed down.
fn push_down(predicate: &Predicate) -> Option<(String, Vec<SqlValue>)> {
    let compare = |field: &str, op: &str, value: &PropertyValue| {
        let path = json_path(field)?;
        let arg = scalar(value)?;
        Some((format!("{path} {op} ?"), vec![arg]))
    };
    match predicate {
        Predicate::All | Predicate::Ne(..) => None,
        Predicate::Eq(f, v) => compare(f, "=", v),
        Predicate::Lt(f, v) => compare(f, "<", v),
        Predicate::Le(f, v) => compare(f, "<=", v),
        Predicate::Gt(f, v) => compare(f, ">", v),
        Predicate::Ge(f, v) => compare(f, ">=", v),
        Predicate::IsNull(f) => json_path(f).map(|p| (format!("{p} IS NULL"), Vec::new())),
        Predicate::NotNull(f) => json_path(f).map(|p| (format!("{p} IS NOT NULL"), Vec::new())),
        Predicate::And(parts) => {
            // A subset of conjuncts is still a valid prefilter.
            let pushed: Vec<_> = parts.iter().filter_map(push_down).collect();
            join(pushed, " AND ")
        }
        Predicate::Or(parts) => {
            let pushed: Option<Vec<_>> = parts.iter().map(push_down).collect();
            join(pushed?, " OR ")
        }
    }
}

fn join(parts: Vec<(String, Vec<SqlValue>)>, sep: &str) -> Option<(String, Vec<SqlValue>)> {
    if parts.is_empty() {
        return None;
    }
    let mut clauses = Vec::with_capacity(parts.len());
    let mut args = Vec::new();
    for (clause, extra) in parts {
        clauses.push(clause);
        args.extend(extra);
    }
    Some((format!("({})", clauses.join(sep)), args))
}

/// Brute-force cosine over stored vectors of current records.
pub fn vector_search(
    conn: &Connection,
    kind: RecordKind,
    field: &str,
    vector: &[f32],
    top_k: usize,
) -> SubstrateResult<Vec<(String, f64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.id, v.data, v.dimensions
             FROM record_vectors v
             JOIN records r ON r.vid = v.vid
             WHERE r.kind = ?1 AND r.is_current = 1 AND v.field = ?2",
        )
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params![kind.as_str(), field], |row| {
            let id: String = row.get(0)?;
            let data: Vec<u8> = row.get(1)?;
            let dims: i64 = row.get(2)?;
            Ok((id, data, dims))
        })
        .map_err(map_sqlite_err)?;

    let mut scored = Vec::new();
    for row in rows {
        let (id, data, dims) = row.map_err(map_sqlite_err)?;
        if dims as usize != vector.len() {
            continue;
        }
        let stored = bytes_to_f32_vec(&data);
        scored.push((id, cosine_similarity(vector, &stored)));
    }
    sort_by_similarity(&mut scored);
    scored.truncate(top_k);
    Ok(scored)
}
