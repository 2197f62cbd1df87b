//! Low-level row access for the four-table schema. Kept separate from
//! `repo.rs` so the `ConfigRepo` surface reads as orchestration, not SQL.

use config_plane_core::{Blob, ConfigError};
use rusqlite::{params, Connection, OptionalExtension};

fn wrap(err: rusqlite::Error) -> ConfigError {
    ConfigError::backend_io(err)
}

pub fn fetch_blob(conn: &Connection, blob_id: i64) -> Result<Blob, ConfigError> {
    let content: Vec<u8> = conn
        .query_row("SELECT content FROM blobs WHERE id = ?1", params![blob_id], |row| {
            row.get(0)
        })
        .map_err(wrap)?;
    Ok(Blob::from(content))
}

pub fn insert_blob(conn: &Connection, content: &[u8]) -> Result<i64, ConfigError> {
    conn.execute("INSERT INTO blobs (content) VALUES (?1)", params![content])
        .map_err(wrap)?;
    Ok(conn.last_insert_rowid())
}

pub fn update_blob(conn: &Connection, blob_id: i64, content: &[u8]) -> Result<(), ConfigError> {
    conn.execute(
        "UPDATE blobs SET content = ?1 WHERE id = ?2",
        params![content, blob_id],
    )
    .map_err(wrap)?;
    Ok(())
}

/// `None` if no row exists for `(snapshot_id, key)`; `Some(None)` if the row
/// exists and is a tombstone; `Some(Some(blob_id))` otherwise.
pub fn find_item(
    conn: &Connection,
    snapshot_id: i64,
    key: &str,
) -> Result<Option<Option<i64>>, ConfigError> {
    conn.query_row(
        "SELECT blob_id FROM snapshot_items WHERE snapshot_id = ?1 AND key = ?2",
        params![snapshot_id, key],
        |row| row.get::<_, Option<i64>>(0),
    )
    .optional()
    .map_err(wrap)
}

pub fn upsert_item(
    conn: &Connection,
    snapshot_id: i64,
    key: &str,
    blob_id: Option<i64>,
) -> Result<(), ConfigError> {
    conn.execute(
        "INSERT INTO snapshot_items (snapshot_id, key, blob_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(snapshot_id, key) DO UPDATE SET blob_id = excluded.blob_id",
        params![snapshot_id, key, blob_id],
    )
    .map_err(wrap)?;
    Ok(())
}

pub fn has_any_item(conn: &Connection, snapshot_id: i64) -> Result<bool, ConfigError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM snapshot_items WHERE snapshot_id = ?1",
            params![snapshot_id],
            |row| row.get(0),
        )
        .map_err(wrap)?;
    Ok(count > 0)
}

/// All `(key, blob_id)` pairs recorded directly against `snapshot_id`
/// (no chain walk — callers decide whether that's enough).
pub fn all_items(conn: &Connection, snapshot_id: i64) -> Result<Vec<(String, Option<i64>)>, ConfigError> {
    let mut stmt = conn
        .prepare("SELECT key, blob_id FROM snapshot_items WHERE snapshot_id = ?1")
        .map_err(wrap)?;
    let rows = stmt
        .query_map(params![snapshot_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(wrap)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(wrap)
}

pub struct SnapshotRow {
    pub parent_id: Option<i64>,
    pub committed: bool,
}

pub fn get_snapshot(conn: &Connection, snapshot_id: i64) -> Result<SnapshotRow, ConfigError> {
    conn.query_row(
        "SELECT parent_id, committed FROM snapshots WHERE id = ?1",
        params![snapshot_id],
        |row| {
            Ok(SnapshotRow {
                parent_id: row.get(0)?,
                committed: row.get::<_, i64>(1)? != 0,
            })
        },
    )
    .map_err(wrap)
}

pub fn insert_snapshot(conn: &Connection, parent_id: Option<i64>, committed: bool) -> Result<i64, ConfigError> {
    conn.execute(
        "INSERT INTO snapshots (parent_id, committed) VALUES (?1, ?2)",
        params![parent_id, committed as i64],
    )
    .map_err(wrap)?;
    Ok(conn.last_insert_rowid())
}

pub fn mark_committed(conn: &Connection, snapshot_id: i64) -> Result<(), ConfigError> {
    conn.execute(
        "UPDATE snapshots SET committed = 1 WHERE id = ?1",
        params![snapshot_id],
    )
    .map_err(wrap)?;
    Ok(())
}

pub fn branch_head(conn: &Connection, name: &str) -> Result<Option<i64>, ConfigError> {
    conn.query_row(
        "SELECT snapshot_id FROM branches WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
    .map_err(wrap)
}

pub fn upsert_branch(conn: &Connection, name: &str, snapshot_id: i64) -> Result<(), ConfigError> {
    conn.execute(
        "INSERT INTO branches (name, snapshot_id) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET snapshot_id = excluded.snapshot_id",
        params![name, snapshot_id],
    )
    .map_err(wrap)?;
    Ok(())
}

pub fn insert_branch(conn: &Connection, name: &str, snapshot_id: i64) -> Result<(), ConfigError> {
    conn.execute(
        "INSERT INTO branches (name, snapshot_id) VALUES (?1, ?2)",
        params![name, snapshot_id],
    )
    .map_err(wrap)?;
    Ok(())
}

pub fn list_branch_names(conn: &Connection) -> Result<Vec<String>, ConfigError> {
    let mut stmt = conn.prepare("SELECT name FROM branches").map_err(wrap)?;
    let rows = stmt.query_map([], |row| row.get(0)).map_err(wrap)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(wrap)
}

/// Single-level lookup of `key` at `snapshot_id`, resolving the blob if
/// present. Correct without recursion only when `snapshot_id` is a
/// finalized (committed) snapshot, which is self-contained by construction.
pub fn read_at(conn: &Connection, snapshot_id: i64, key: &str) -> Result<Option<Blob>, ConfigError> {
    match find_item(conn, snapshot_id, key)? {
        None => Ok(None),
        Some(None) => Ok(None),
        Some(Some(blob_id)) => fetch_blob(conn, blob_id).map(Some),
    }
}
