use config_plane_core::ConfigError;
use rusqlite::Connection;

/// Create the four tables of spec §4.3 if they don't already exist.
///
/// Clients are expected to run this (or an equivalent migration) before
/// first use; it is idempotent so re-running it on an already-initialized
/// database is harmless.
pub fn init_schema(conn: &Connection) -> Result<(), ConfigError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS blobs (
            id      INTEGER PRIMARY KEY,
            content BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS snapshots (
            id        INTEGER PRIMARY KEY,
            parent_id INTEGER REFERENCES snapshots(id),
            committed INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS snapshot_items (
            snapshot_id INTEGER NOT NULL REFERENCES snapshots(id),
            key         TEXT NOT NULL,
            blob_id     INTEGER REFERENCES blobs(id),
            PRIMARY KEY (snapshot_id, key)
        );

        CREATE TABLE IF NOT EXISTS branches (
            name        TEXT PRIMARY KEY,
            snapshot_id INTEGER NOT NULL REFERENCES snapshots(id)
        );
        "#,
    )
    .map_err(ConfigError::backend_io)?;
    Ok(())
}
