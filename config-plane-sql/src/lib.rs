//! Relational backend for the branched, versioned configuration store,
//! over SQLite via `rusqlite` (spec §4.3).
//!
//! The schema is four tables: `blobs`, `snapshots`, `snapshot_items`,
//! `branches`. [`init_schema`] creates them; [`SqlRepo`] implements
//! [`config_plane_core::ConfigRepo`] against a connection that already has
//! them.

mod db;
mod repo;
mod schema;

pub use repo::SqlRepo;
pub use schema::init_schema;

#[cfg(test)]
mod tests {
    use super::*;
    use config_plane_core::{Blob, ConfigError, ConfigRepo, Update, DEFAULT_BRANCH};
    use rusqlite::Connection;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn dirty_after_set_clean_after_commit() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        assert!(!repo.is_dirty().unwrap());
        repo.set("k", Blob::from_static(b"v").into()).unwrap();
        assert!(repo.is_dirty().unwrap());
        repo.commit().unwrap();
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn read_your_writes() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("k", Blob::from_static(b"v").into()).unwrap();
        repo.commit().unwrap();
        assert_eq!(repo.get("k").unwrap(), Some(Blob::from_static(b"v")));
    }

    #[test]
    fn tombstone_erasure() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("k", Blob::from_static(b"v").into()).unwrap();
        repo.commit().unwrap();
        repo.set("k", Update::Delete).unwrap();
        repo.commit().unwrap();
        assert_eq!(repo.get("k").unwrap(), None);
    }

    #[test]
    fn commit_is_noop_when_clean() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("k", Blob::from_static(b"v").into()).unwrap();
        repo.commit().unwrap();
        let head_before = repo.get("k").unwrap();
        repo.commit().unwrap();
        assert_eq!(repo.get("k").unwrap(), head_before);
    }

    #[test]
    fn switch_to_unknown_branch() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        let err = repo.switch_branch("nope").unwrap_err();
        assert!(matches!(err, ConfigError::MissingBranch { .. }));
    }

    #[test]
    fn branch_isolation() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("k", Blob::from_static(b"v1").into()).unwrap();
        repo.commit().unwrap();
        repo.create_branch("dev", Some(DEFAULT_BRANCH)).unwrap();
        repo.switch_branch("dev").unwrap();
        repo.set("k", Blob::from_static(b"v2").into()).unwrap();
        repo.commit().unwrap();
        repo.switch_branch(DEFAULT_BRANCH).unwrap();
        assert_eq!(repo.get("k").unwrap(), Some(Blob::from_static(b"v1")));
    }

    #[test]
    fn merge_disjoint_union_and_source_wins() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("a", Blob::from_static(b"1").into()).unwrap();
        repo.commit().unwrap();

        repo.create_branch("dev", None).unwrap();
        repo.switch_branch("dev").unwrap();
        repo.set("b", Blob::from_static(b"2").into()).unwrap();
        repo.commit().unwrap();

        repo.switch_branch(DEFAULT_BRANCH).unwrap();
        repo.set("c", Blob::from_static(b"3").into()).unwrap();
        repo.commit().unwrap();

        repo.merge("dev").unwrap();
        assert_eq!(repo.get("a").unwrap(), Some(Blob::from_static(b"1")));
        assert_eq!(repo.get("b").unwrap(), Some(Blob::from_static(b"2")));
        assert_eq!(repo.get("c").unwrap(), Some(Blob::from_static(b"3")));
    }

    #[test]
    fn merge_source_wins_on_conflict() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("theme", Blob::from_static(b"light").into()).unwrap();
        repo.commit().unwrap();

        repo.create_branch("dev", None).unwrap();
        repo.switch_branch("dev").unwrap();
        repo.set("theme", Blob::from_static(b"dark").into()).unwrap();
        repo.commit().unwrap();

        repo.switch_branch(DEFAULT_BRANCH).unwrap();
        repo.set("theme", Blob::from_static(b"high-contrast").into()).unwrap();
        repo.commit().unwrap();

        repo.merge("dev").unwrap();
        assert_eq!(repo.get("theme").unwrap(), Some(Blob::from_static(b"dark")));
    }

    #[test]
    fn merge_deletion_propagates() {
        let mut repo = SqlRepo::with_default_branch(open()).unwrap();
        repo.set("k", Blob::from_static(b"x").into()).unwrap();
        repo.commit().unwrap();

        repo.create_branch("dev", None).unwrap();
        repo.switch_branch("dev").unwrap();
        repo.set("k", Update::Delete).unwrap();
        repo.commit().unwrap();

        repo.switch_branch(DEFAULT_BRANCH).unwrap();
        repo.merge("dev").unwrap();
        assert_eq!(repo.get("k").unwrap(), None);
    }

    #[test]
    fn resume_rejects_committed_snapshot() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(tmp.path()).unwrap();
            init_schema(&conn).unwrap();
            let mut repo = SqlRepo::with_default_branch(conn).unwrap();
            // The repo's first stage snapshot is id 1; committing it marks
            // id 1 `committed = true` and allocates a fresh stage as id 2.
            repo.set("k", Blob::from_static(b"v").into()).unwrap();
            repo.commit().unwrap();
        }

        let conn = Connection::open(tmp.path()).unwrap();
        let err = SqlRepo::resume(conn, 1, DEFAULT_BRANCH).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResume { .. }));
    }

    #[test]
    fn resume_live_stage() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let stage_id = {
            let conn = Connection::open(tmp.path()).unwrap();
            init_schema(&conn).unwrap();
            let mut repo = SqlRepo::with_default_branch(conn).unwrap();
            repo.set("k", Blob::from_static(b"v1").into()).unwrap();
            repo.commit().unwrap();
            repo.set("k", Blob::from_static(b"v2").into()).unwrap();
            // Leave the stage dirty (uncommitted) and "crash" here.
            2
        };

        let conn = Connection::open(tmp.path()).unwrap();
        let repo = SqlRepo::resume(conn, stage_id, DEFAULT_BRANCH).unwrap();
        assert!(repo.is_dirty().unwrap());
        assert_eq!(repo.get("k").unwrap(), Some(Blob::from_static(b"v2")));
    }

    #[test]
    fn persistence_across_reopen() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(tmp.path()).unwrap();
            init_schema(&conn).unwrap();
            let mut repo = SqlRepo::with_default_branch(conn).unwrap();
            repo.set("db", Blob::from_static(b"localhost").into()).unwrap();
            repo.commit().unwrap();
        }
        let conn = Connection::open(tmp.path()).unwrap();
        let repo = SqlRepo::with_default_branch(conn).unwrap();
        assert_eq!(repo.get("db").unwrap(), Some(Blob::from_static(b"localhost")));
    }
}
