use config_plane_core::{Blob, ConfigError, ConfigRepo, Update, DEFAULT_BRANCH};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::db;

/// Relational [`ConfigRepo`] implementation over SQLite (spec §4.3).
///
/// The current stage is represented as a `committed = false` row in the
/// `snapshots` table (the "live snapshot" trick from SPEC_FULL §4.2/design
/// notes): this lets reads use the same lookup path as committed reads, and
/// lets commit be a single-transaction "finalize and flip branch pointer".
#[derive(Debug)]
pub struct SqlRepo {
    conn: Connection,
    branch: String,
    /// The stage's sparse overlay snapshot id (`committed = false`).
    stage_snapshot_id: i64,
    /// The committed snapshot the stage currently falls back to, if any.
    /// Tracked independently of the DB row's `parent_id` column so that
    /// `reload` can repoint it without disturbing the stage's own lineage
    /// (used by `commit`'s finalize step).
    parent_snapshot_id: Option<i64>,
}

impl SqlRepo {
    /// Open a repo against `conn` on `branch` (default `master`), starting
    /// a fresh stage parented at the branch's current head.
    pub fn new(conn: Connection, branch: impl Into<String>) -> Result<Self, ConfigError> {
        let branch = branch.into();
        let parent_snapshot_id = db::branch_head(&conn, &branch)?;
        let stage_snapshot_id = db::insert_snapshot(&conn, parent_snapshot_id, false)?;
        Ok(SqlRepo {
            conn,
            branch,
            stage_snapshot_id,
            parent_snapshot_id,
        })
    }

    /// Open a repo on `branch` with its default name ("master").
    pub fn with_default_branch(conn: Connection) -> Result<Self, ConfigError> {
        Self::new(conn, DEFAULT_BRANCH)
    }

    /// Resume an existing live stage snapshot rather than starting a fresh
    /// one — e.g. after a process restart that wants to pick its own
    /// in-progress edits back up. Fails with [`ConfigError::InvalidResume`]
    /// if `stage_snapshot_id` is already committed.
    pub fn resume(
        conn: Connection,
        stage_snapshot_id: i64,
        branch: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let snap = db::get_snapshot(&conn, stage_snapshot_id)?;
        if snap.committed {
            return Err(ConfigError::InvalidResume {
                snapshot_id: stage_snapshot_id,
            });
        }
        Ok(SqlRepo {
            conn,
            branch: branch.into(),
            stage_snapshot_id,
            parent_snapshot_id: snap.parent_id,
        })
    }

    fn start_new_stage(&mut self) -> Result<(), ConfigError> {
        self.parent_snapshot_id = db::branch_head(&self.conn, &self.branch)?;
        self.stage_snapshot_id = db::insert_snapshot(&self.conn, self.parent_snapshot_id, false)?;
        Ok(())
    }
}

impl ConfigRepo for SqlRepo {
    #[instrument(skip(self), level = "debug", fields(branch = %self.branch))]
    fn get(&self, key: &str) -> Result<Option<Blob>, ConfigError> {
        if let Some(blob_id) = db::find_item(&self.conn, self.stage_snapshot_id, key)? {
            return Ok(match blob_id {
                Some(id) => Some(db::fetch_blob(&self.conn, id)?),
                None => None,
            });
        }
        match self.parent_snapshot_id {
            Some(parent_id) => db::read_at(&self.conn, parent_id, key),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(branch = %self.branch))]
    fn set(&mut self, key: &str, value: Update) -> Result<(), ConfigError> {
        let existing = db::find_item(&self.conn, self.stage_snapshot_id, key)?;
        let new_blob_id = match (existing, value) {
            (Some(Some(blob_id)), Update::Set(blob)) => {
                // Stable blob identity for the duration of the stage.
                db::update_blob(&self.conn, blob_id, &blob)?;
                Some(blob_id)
            }
            (_, Update::Set(blob)) => Some(db::insert_blob(&self.conn, &blob)?),
            (_, Update::Delete) => None,
        };
        db::upsert_item(&self.conn, self.stage_snapshot_id, key, new_blob_id)?;
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool, ConfigError> {
        db::has_any_item(&self.conn, self.stage_snapshot_id)
    }

    #[instrument(skip(self), level = "debug", fields(branch = %self.branch))]
    fn commit(&mut self) -> Result<(), ConfigError> {
        if !self.is_dirty()? {
            debug!("commit on clean stage is a no-op");
            return Ok(());
        }

        let tx = self.conn.transaction().map_err(ConfigError::backend_io)?;

        if let Some(parent_id) = self.parent_snapshot_id {
            let already = db::all_items(&tx, self.stage_snapshot_id)?
                .into_iter()
                .map(|(key, _)| key)
                .collect::<std::collections::HashSet<_>>();
            for (key, blob_id) in db::all_items(&tx, parent_id)? {
                if !already.contains(&key) {
                    db::upsert_item(&tx, self.stage_snapshot_id, &key, blob_id)?;
                }
            }
        }

        db::mark_committed(&tx, self.stage_snapshot_id)?;
        db::upsert_branch(&tx, &self.branch, self.stage_snapshot_id)?;

        let committed_id = self.stage_snapshot_id;
        let new_stage_id = db::insert_snapshot(&tx, Some(committed_id), false)?;

        tx.commit().map_err(ConfigError::backend_io)?;

        self.parent_snapshot_id = Some(committed_id);
        self.stage_snapshot_id = new_stage_id;
        info!(branch = %self.branch, snapshot = committed_id, "committed new snapshot");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn switch_branch(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.is_dirty()? {
            return Err(ConfigError::DirtyStage {
                branch: self.branch.clone(),
            });
        }
        if db::branch_head(&self.conn, name)?.is_none() {
            return Err(ConfigError::MissingBranch {
                name: name.to_string(),
            });
        }
        self.branch = name.to_string();
        self.start_new_stage()
    }

    #[instrument(skip(self), level = "debug")]
    fn create_branch(&mut self, new: &str, from: Option<&str>) -> Result<(), ConfigError> {
        if db::branch_head(&self.conn, new)?.is_some() {
            return Err(ConfigError::BranchExists {
                name: new.to_string(),
            });
        }
        let source = from.unwrap_or(&self.branch);
        let snapshot_id = db::branch_head(&self.conn, source)?.ok_or_else(|| ConfigError::MissingBranch {
            name: source.to_string(),
        })?;
        db::insert_branch(&self.conn, new, snapshot_id)?;
        info!(new_branch = new, from = source, "created branch");
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<String>, ConfigError> {
        db::list_branch_names(&self.conn)
    }

    #[instrument(skip(self), level = "debug")]
    fn merge(&mut self, source: &str) -> Result<(), ConfigError> {
        let source_head = db::branch_head(&self.conn, source)?.ok_or_else(|| ConfigError::MissingBranch {
            name: source.to_string(),
        })?;

        for (key, blob_id) in db::all_items(&self.conn, source_head)? {
            let value = match blob_id {
                Some(id) => Update::Set(db::fetch_blob(&self.conn, id)?),
                None => Update::Delete,
            };
            self.set(&key, value)?;
        }

        self.commit()?;
        info!(source, target = %self.branch, "merged");
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ConfigError> {
        self.parent_snapshot_id = db::branch_head(&self.conn, &self.branch)?;
        Ok(())
    }
}
