use std::fs;
use std::path::{Path, PathBuf};

use config_plane_core::{Blob, ConfigError, ConfigRepo, Update, DEFAULT_BRANCH};
use tracing::{info, instrument, warn};

use crate::key;
use crate::run::GitRunner;

const REMOTE_NAME: &str = "origin";

/// Git-backed [`ConfigRepo`] implementation (spec §4.4).
///
/// A key maps to a file path relative to the working-tree root; `get`/`set`
/// read and write that file directly (the "Stage" *is* the working tree).
/// Porcelain-level operations (`status`, `add`, `commit`, `push`, branch
/// management, merges) shell out to the `git` binary via [`GitRunner`];
/// read-only access to a specific commit goes through `git2` instead of
/// `git show`.
pub struct VcsRepo {
    work_path: PathBuf,
    remote: Option<String>,
    branch: String,
    git: GitRunner,
}

impl VcsRepo {
    /// Open (cloning from `remote` if the path has no `.git`, else
    /// `git init`-ing it) a repo at `work_path` on `branch`.
    #[instrument(skip(remote, work_path, branch), level = "debug")]
    pub fn new(
        work_path: impl AsRef<Path>,
        remote: Option<&str>,
        branch: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let work_path = work_path.as_ref().to_path_buf();
        let branch = branch.into();

        if !work_path.join(".git").exists() {
            fs::create_dir_all(&work_path)?;
            match remote {
                Some(remote_url) => {
                    let mut builder = git2::build::RepoBuilder::new();
                    builder.branch(&branch);
                    builder
                        .clone(remote_url, &work_path)
                        .map_err(ConfigError::backend_io)?;
                }
                None => {
                    let mut opts = git2::RepositoryInitOptions::new();
                    opts.initial_head(&branch);
                    git2::Repository::init_opts(&work_path, &opts).map_err(ConfigError::backend_io)?;
                }
            }
        }

        let git = GitRunner::new(work_path.clone());
        let mut repo = VcsRepo {
            work_path,
            remote: remote.map(str::to_string),
            branch: branch.clone(),
            git,
        };

        let current = repo.git.run_text(&["branch", "--show-current"]).unwrap_or_default();
        if current != branch {
            if repo.git.run(&["checkout", &branch]).is_err() {
                repo.git
                    .run(&["checkout", "-b", &branch, &format!("{REMOTE_NAME}/{branch}")])?;
            }
        }

        repo.reload()?;
        Ok(repo)
    }

    /// Open a repo on the default branch ("master") with no remote.
    pub fn local(work_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::new(work_path, None, DEFAULT_BRANCH)
    }

    fn file_path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        key::validate(key)?;
        Ok(self.work_path.join(key))
    }

    /// Read `key` as of `commit_ish` (e.g. `"HEAD"`, a branch name, a
    /// commit hash) without touching the working tree, using `git2`
    /// directly rather than shelling out to `git show`.
    pub fn read_from_commit(&self, commit_ish: &str, key: &str) -> Result<Option<Blob>, ConfigError> {
        key::validate(key)?;
        let repo = git2::Repository::open(&self.work_path).map_err(ConfigError::backend_io)?;
        let object = match repo.revparse_single(commit_ish) {
            Ok(object) => object,
            Err(_) => return Ok(None),
        };
        let commit = object.peel_to_commit().map_err(ConfigError::backend_io)?;
        let tree = commit.tree().map_err(ConfigError::backend_io)?;
        match tree.get_path(Path::new(key)) {
            Ok(entry) => {
                let object = entry.to_object(&repo).map_err(ConfigError::backend_io)?;
                match object.as_blob() {
                    Some(blob) => Ok(Some(Blob::copy_from_slice(blob.content()))),
                    None => Ok(None),
                }
            }
            Err(_) => Ok(None),
        }
    }

    fn resolve_merge_target(&self, source: &str) -> Result<String, ConfigError> {
        let branches = self.list_branches()?;
        if branches.iter().any(|b| b == source) {
            return Ok(source.to_string());
        }
        if self.remote.is_some() {
            return Ok(format!("{REMOTE_NAME}/{source}"));
        }
        Err(ConfigError::MissingBranch {
            name: source.to_string(),
        })
    }
}

impl ConfigRepo for VcsRepo {
    fn get(&self, key: &str) -> Result<Option<Blob>, ConfigError> {
        let path = self.file_path(key)?;
        if !path.is_file() {
            // A file physically absent from the working tree is absent,
            // whether that's because it was `set(k, ⊥)`'d or the parent
            // commit never had it — matches git's own "deleted in
            // worktree" semantics.
            return Ok(None);
        }
        Ok(Some(Blob::from(fs::read(path)?)))
    }

    fn set(&mut self, key: &str, value: Update) -> Result<(), ConfigError> {
        let path = self.file_path(key)?;
        match value {
            Update::Set(blob) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, &blob)?;
            }
            Update::Delete => {
                if path.is_file() {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool, ConfigError> {
        let status = self.git.run_text(&["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    #[instrument(skip(self), level = "debug", fields(branch = %self.branch))]
    fn commit(&mut self) -> Result<(), ConfigError> {
        if !self.is_dirty()? {
            return Ok(());
        }
        self.git.run(&["add", "-A"])?;
        self.git.run(&["commit", "-m", "Update config"])?;
        if self.remote.is_some() {
            self.git.run(&["push", REMOTE_NAME, &self.branch])?;
        }
        info!(branch = %self.branch, "committed new snapshot");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn switch_branch(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.is_dirty()? {
            return Err(ConfigError::DirtyStage {
                branch: self.branch.clone(),
            });
        }

        let local_branches = self.list_branches()?;
        let has_local = local_branches.iter().any(|b| b == name);
        let has_remote_tracking = self.remote.is_some()
            && self
                .git
                .run(&["rev-parse", "--verify", &format!("{REMOTE_NAME}/{name}")])
                .is_ok();
        if !has_local && !has_remote_tracking {
            return Err(ConfigError::MissingBranch {
                name: name.to_string(),
            });
        }

        if has_local {
            self.git.run(&["checkout", name])?;
        } else {
            self.git
                .run(&["checkout", "-b", name, &format!("{REMOTE_NAME}/{name}")])?;
        }
        self.branch = name.to_string();
        self.reload()
    }

    #[instrument(skip(self), level = "debug")]
    fn create_branch(&mut self, new: &str, from: Option<&str>) -> Result<(), ConfigError> {
        let branches = self.list_branches()?;
        if branches.iter().any(|b| b == new) {
            return Err(ConfigError::BranchExists {
                name: new.to_string(),
            });
        }
        let source = from.unwrap_or(&self.branch);
        if !branches.iter().any(|b| b == source) {
            return Err(ConfigError::MissingBranch {
                name: source.to_string(),
            });
        }
        // `git branch <new> <source>` creates without switching (SPEC_FULL
        // §9, Open Question a: create_branch never switches the current
        // branch, on any backend).
        self.git.run(&["branch", new, source])?;
        info!(new_branch = new, from = source, "created branch");
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<String>, ConfigError> {
        let out = self.git.run_text(&["branch", "--format=%(refname:short)"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    #[instrument(skip(self), level = "debug")]
    fn merge(&mut self, source: &str) -> Result<(), ConfigError> {
        if self.remote.is_some() {
            // Best-effort: failure to fetch doesn't block a local merge.
            let _ = self.git.run(&["fetch", REMOTE_NAME]);
        }
        let target = self.resolve_merge_target(source)?;

        // Source wins at the hunk level via `-X theirs` — a deliberate
        // choice (SPEC_FULL §9, Open Question c) that matches the original
        // implementation and its documented caveat that hunk-level "theirs"
        // can diverge from pure byte-identity "source wins" on textual
        // merges. Not changed to whole-file overwrite.
        if let Err(detail) = self
            .git
            .try_run(&["merge", &target, "-m", &format!("Merge {source}"), "-X", "theirs"])
        {
            return Err(ConfigError::MergeFailed {
                source_branch: source.to_string(),
                detail,
            });
        }

        if self.remote.is_some() {
            self.git.run(&["push", REMOTE_NAME, &self.branch])?;
        }

        self.reload()?;
        info!(source, target = %self.branch, "merged");
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ConfigError> {
        if self.remote.is_some() {
            if let Err(err) = self.git.run(&["pull", REMOTE_NAME, &self.branch]) {
                warn!(%err, "best-effort reload from remote failed");
            }
        }
        // Confirm the local head is still readable; an unreadable local
        // repo (as opposed to a merely unborn branch) is the one case
        // `reload` must raise on.
        if git2::Repository::open(&self.work_path).is_err() {
            return Err(ConfigError::backend_io_msg(format!(
                "local repository at {:?} is unreadable",
                self.work_path
            )));
        }
        Ok(())
    }
}
