use std::cell::RefCell;
use std::rc::Rc;

use config_plane_core::ConfigRepo;
use config_plane_memory::{MemoryRepo, SharedMemoryStore};
use config_plane_sql::SqlRepo;
use config_plane_vcs::VcsRepo;
use rusqlite::Connection;
use tempfile::TempDir;

use crate::RepoProvider;

/// Shares one in-process store across every `open()` call, mirroring the
/// original memory backend's test fixture of one dict handed to many
/// repo instances.
#[derive(Default)]
pub struct MemoryProvider {
    store: SharedMemoryStore,
}

impl MemoryProvider {
    pub fn new() -> Self {
        MemoryProvider {
            store: SharedMemoryStore::default(),
        }
    }
}

impl RepoProvider for MemoryProvider {
    fn open(&self, branch: &str) -> Box<dyn ConfigRepo> {
        Box::new(MemoryRepo::with_store(self.store.clone(), branch))
    }
}

/// Backs every `open()` call with the same SQLite file on disk, held open
/// for the provider's lifetime so the temp directory isn't cleaned up
/// mid-test.
pub struct SqlProvider {
    _dir: TempDir,
    path: std::path::PathBuf,
}

impl SqlProvider {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.sqlite3");
        let conn = Connection::open(&path).unwrap();
        config_plane_sql::init_schema(&conn).unwrap();
        SqlProvider { _dir: dir, path }
    }
}

impl Default for SqlProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoProvider for SqlProvider {
    fn open(&self, branch: &str) -> Box<dyn ConfigRepo> {
        let conn = Connection::open(&self.path).unwrap();
        Box::new(SqlRepo::new(conn, branch).unwrap())
    }
}

/// Backs every `open()` call with a fresh clone of one bare "origin" repo,
/// mirroring the git backend's own test fixture of a shared bare remote.
pub struct VcsProvider {
    origin: TempDir,
    clones: Rc<RefCell<Vec<TempDir>>>,
}

impl VcsProvider {
    pub fn new() -> Self {
        let origin = tempfile::tempdir().unwrap();
        let status = std::process::Command::new("git")
            .args(["init", "--bare", "-b", config_plane_core::DEFAULT_BRANCH])
            .current_dir(origin.path())
            .status()
            .unwrap();
        assert!(status.success());
        VcsProvider {
            origin,
            clones: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Default for VcsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoProvider for VcsProvider {
    fn open(&self, branch: &str) -> Box<dyn ConfigRepo> {
        let origin_url = self.origin.path().to_str().unwrap();
        let clone_dir = tempfile::tempdir().unwrap();
        let repo = VcsRepo::new(clone_dir.path(), Some(origin_url), branch).unwrap();
        self.clones.borrow_mut().push(clone_dir);
        Box::new(repo)
    }
}
