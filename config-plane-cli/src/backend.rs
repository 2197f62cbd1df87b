use config_plane_core::ConfigRepo;
use config_plane_memory::MemoryRepo;
use config_plane_sql::SqlRepo;
use config_plane_vcs::VcsRepo;
use eyre::{eyre, Context};
use rusqlite::Connection;

use config_plane_cli::cli::{Backend, BackendArgs};

/// Construct the backend requested on the command line, already pointed at
/// `branch`.
pub fn open(args: &BackendArgs, branch: &str) -> eyre::Result<Box<dyn ConfigRepo>> {
    match args.backend {
        Backend::Memory => Ok(Box::new(MemoryRepo::new(branch))),

        Backend::Sql => {
            let path = args
                .db_path
                .as_ref()
                .ok_or_else(|| eyre!("--db-path is required for --backend sql"))?;
            let conn = Connection::open(path)
                .with_context(|| format!("opening sqlite database at {path:?}"))?;
            config_plane_sql::init_schema(&conn)?;
            Ok(Box::new(SqlRepo::new(conn, branch)?))
        }

        Backend::Vcs => {
            let path = args
                .repo_path
                .as_ref()
                .ok_or_else(|| eyre!("--repo-path is required for --backend vcs"))?;
            let repo = VcsRepo::new(path, args.remote.as_deref(), branch)
                .with_context(|| format!("opening git-backed repo at {path:?}"))?;
            Ok(Box::new(repo))
        }
    }
}
