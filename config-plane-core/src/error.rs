use std::fmt;

/// Errors surfaced by a [`crate::ConfigRepo`] implementation.
///
/// `absent` values from [`crate::ConfigRepo::get`] are `Ok(None)`, not an
/// error variant here — see spec §7.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `switch_branch` was called while the stage had pending changes.
    #[error("cannot switch away from branch '{branch}' while the stage is dirty")]
    DirtyStage {
        /// The branch the caller tried to switch away from.
        branch: String,
    },

    /// `create_branch` was called with a name that already exists.
    #[error("branch '{name}' already exists")]
    BranchExists {
        /// The branch name that collided.
        name: String,
    },

    /// A branch named in `create_branch`'s `from`, or in `switch_branch`,
    /// `merge`, does not exist or has no committed head.
    #[error("branch '{name}' does not exist or has no committed head")]
    MissingBranch {
        /// The branch name that could not be resolved.
        name: String,
    },

    /// The VCS backend's `git merge` failed (conflict or non-fast-forward).
    #[error("merge of '{source_branch}' failed: {detail}")]
    MergeFailed {
        /// The source branch that failed to merge.
        source_branch: String,
        /// Diagnostic text captured from the underlying tool.
        detail: String,
    },

    /// The relational backend was asked to resume a snapshot that is
    /// already `committed = true` as though it were a live stage.
    #[error("cannot resume committed snapshot {snapshot_id} as a stage")]
    InvalidResume {
        /// The snapshot id that was rejected.
        snapshot_id: i64,
    },

    /// A key is not valid for the backend (e.g. the VCS backend rejects
    /// keys that would escape the working tree).
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Transport, database, or subprocess failure. Carries the underlying
    /// diagnostic. Each backend wraps its own error type (`io::Error`,
    /// `rusqlite::Error`, `git2::Error`, a nonzero `git` exit) into this
    /// variant rather than the core crate depending on every backend crate.
    #[error("backend I/O error: {0}")]
    BackendIo(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ConfigError {
    /// Wrap an arbitrary backend error as [`ConfigError::BackendIo`].
    pub fn backend_io<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::BackendIo(Box::new(err))
    }

    /// Wrap a plain message as [`ConfigError::BackendIo`], for cases (like a
    /// non-zero `git` exit) that don't already have an `Error` type.
    pub fn backend_io_msg(msg: impl Into<String>) -> Self {
        #[derive(Debug)]
        struct Msg(String);
        impl fmt::Display for Msg {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
        impl std::error::Error for Msg {}
        ConfigError::BackendIo(Box::new(Msg(msg.into())))
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::backend_io(err)
    }
}
