//! Git-backed backend for the branched, versioned configuration store
//! (spec §4.4). Keys are relative file paths in a working tree; branches,
//! commits and merges are the repository's own.

mod key;
mod repo;
mod run;

pub use repo::VcsRepo;

#[cfg(test)]
mod tests {
    use super::*;
    use config_plane_core::{Blob, ConfigError, ConfigRepo, Update, DEFAULT_BRANCH};
    use std::process::Command;
    use tempfile::TempDir;

    fn init_bare_origin() -> TempDir {
        let origin = tempfile::tempdir().unwrap();
        let status = Command::new("git")
            .args(["init", "--bare", "-b", DEFAULT_BRANCH])
            .current_dir(origin.path())
            .status()
            .unwrap();
        assert!(status.success());
        origin
    }

    fn local_repo() -> (TempDir, VcsRepo) {
        let dir = tempfile::tempdir().unwrap();
        let repo = VcsRepo::local(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn dirty_after_set_clean_after_commit() {
        let (_dir, mut repo) = local_repo();
        assert!(!repo.is_dirty().unwrap());
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        assert!(repo.is_dirty().unwrap());
        repo.commit().unwrap();
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn read_your_writes() {
        let (_dir, mut repo) = local_repo();
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        repo.commit().unwrap();
        assert_eq!(repo.get("app.conf").unwrap(), Some(Blob::from_static(b"v1")));
    }

    #[test]
    fn tombstone_erasure() {
        let (_dir, mut repo) = local_repo();
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        repo.commit().unwrap();
        repo.set("app.conf", Update::Delete).unwrap();
        repo.commit().unwrap();
        assert_eq!(repo.get("app.conf").unwrap(), None);
    }

    #[test]
    fn rejects_path_traversal_keys() {
        let (_dir, mut repo) = local_repo();
        let err = repo.set("../escape", Blob::from_static(b"x").into()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { .. }));
    }

    #[test]
    fn switch_forbidden_while_dirty() {
        let (_dir, mut repo) = local_repo();
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        repo.create_branch("dev", None).unwrap();
        let err = repo.switch_branch("dev").unwrap_err();
        assert!(matches!(err, ConfigError::DirtyStage { .. }));
    }

    #[test]
    fn create_branch_never_switches() {
        let (_dir, mut repo) = local_repo();
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        repo.commit().unwrap();
        repo.create_branch("dev", None).unwrap();
        assert_eq!(repo.get("app.conf").unwrap(), Some(Blob::from_static(b"v1")));
        let branches = repo.list_branches().unwrap();
        assert!(branches.iter().any(|b| b == "dev"));
        assert!(branches.iter().any(|b| b == DEFAULT_BRANCH));
    }

    #[test]
    fn create_branch_already_exists() {
        let (_dir, mut repo) = local_repo();
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        repo.commit().unwrap();
        repo.create_branch("dev", None).unwrap();
        let err = repo.create_branch("dev", None).unwrap_err();
        assert!(matches!(err, ConfigError::BranchExists { .. }));
    }

    #[test]
    fn switch_to_unknown_branch() {
        let (_dir, mut repo) = local_repo();
        repo.set("app.conf", Blob::from_static(b"v1").into()).unwrap();
        repo.commit().unwrap();
        let err = repo.switch_branch("nope").unwrap_err();
        assert!(matches!(err, ConfigError::MissingBranch { .. }));
    }

    #[test]
    fn branch_isolation() {
        let (_dir, mut repo) = local_repo();
        repo.set("theme", Blob::from_static(b"light").into()).unwrap();
        repo.commit().unwrap();
        repo.create_branch("dev", None).unwrap();
        repo.switch_branch("dev").unwrap();
        repo.set("theme", Blob::from_static(b"dark").into()).unwrap();
        repo.commit().unwrap();
        repo.switch_branch(DEFAULT_BRANCH).unwrap();
        assert_eq!(repo.get("theme").unwrap(), Some(Blob::from_static(b"light")));
    }

    #[test]
    fn merge_disjoint_union_and_source_wins() {
        let (_dir, mut repo) = local_repo();
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
    fn merge_deletion_propagates() {
        let (_dir, mut repo) = local_repo();
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
    fn merge_missing_branch() {
        let (_dir, mut repo) = local_repo();
        repo.set("k", Blob::from_static(b"x").into()).unwrap();
        repo.commit().unwrap();
        let err = repo.merge("nope").unwrap_err();
        assert!(matches!(err, ConfigError::MissingBranch { .. }));
    }

    #[test]
    fn clone_and_push_round_trip() {
        let origin = init_bare_origin();
        let origin_url = origin.path().to_str().unwrap();

        let a_dir = tempfile::tempdir().unwrap();
        let mut a = VcsRepo::new(a_dir.path(), None, DEFAULT_BRANCH).unwrap();
        a.set("seed", Blob::from_static(b"1").into()).unwrap();
        a.commit().unwrap();
        Command::new("git")
            .args(["remote", "add", "origin", origin_url])
            .current_dir(a_dir.path())
            .status()
            .unwrap();
        Command::new("git")
            .args(["push", "origin", DEFAULT_BRANCH])
            .current_dir(a_dir.path())
            .status()
            .unwrap();

        let b_dir = tempfile::tempdir().unwrap();
        let b = VcsRepo::new(b_dir.path(), Some(origin_url), DEFAULT_BRANCH).unwrap();
        assert_eq!(b.get("seed").unwrap(), Some(Blob::from_static(b"1")));
    }
}
