use crate::{Blob, ConfigError, Update};

/// The backend-neutral repository contract (spec §4.1).
///
/// Every backend (memory, relational, VCS) implements this trait. Callers
/// should program against `dyn ConfigRepo` or a generic `R: ConfigRepo`
/// rather than any one backend's concrete type, so that switching backends
/// never touches call sites.
///
/// All operations are synchronous and blocking (spec §5): none of them
/// suspend cooperatively, and a single `ConfigRepo` instance must not be
/// driven concurrently from multiple threads.
pub trait ConfigRepo {
    /// Read the effective value of `key` on the current branch: the stage
    /// override wins over the parent snapshot, a tombstone yields `None`,
    /// and a miss in both yields `None`.
    fn get(&self, key: &str) -> Result<Option<Blob>, ConfigError>;

    /// Install an override in the stage. `Update::Delete` installs a
    /// tombstone. Idempotent, and always marks the stage dirty even if the
    /// new value equals what's already committed.
    fn set(&mut self, key: &str, value: Update) -> Result<(), ConfigError>;

    /// True iff the stage has any pending override (or, for the VCS
    /// backend, the working tree is non-clean versus `HEAD`).
    fn is_dirty(&self) -> Result<bool, ConfigError>;

    /// If the stage is clean, a no-op. Otherwise: freeze the stage into a
    /// new snapshot, advance the current branch pointer to it, and start a
    /// fresh empty stage parented at the new head.
    fn commit(&mut self) -> Result<(), ConfigError>;

    /// Switch to a different branch. Fails with
    /// [`ConfigError::DirtyStage`] if the stage has pending changes, or
    /// [`ConfigError::MissingBranch`] if `name` does not exist.
    fn switch_branch(&mut self, name: &str) -> Result<(), ConfigError>;

    /// Create a new branch pointing at the current head of `from`
    /// (defaulting to the current branch). Never switches the current
    /// branch (see SPEC_FULL §9, Open Question a). Fails with
    /// [`ConfigError::BranchExists`] if `new` already exists, or
    /// [`ConfigError::MissingBranch`] if `from` has no committed head.
    fn create_branch(&mut self, new: &str, from: Option<&str>) -> Result<(), ConfigError>;

    /// All known branch names, in a stable-within-call but otherwise
    /// unspecified order.
    fn list_branches(&self) -> Result<Vec<String>, ConfigError>;

    /// Merge `source`'s branch state into the current branch: source wins
    /// on conflicting keys, disjoint keys from both sides are unioned, and
    /// a tombstone at the source propagates as a deletion on the target.
    /// Always produces a commit on the current branch.
    fn merge(&mut self, source: &str) -> Result<(), ConfigError>;

    /// Refresh this repo's view of the current branch head from durable
    /// storage. Best-effort for remote-backed backends: a failed remote
    /// sync does not raise as long as the local head is still readable.
    /// Never resets a dirty stage.
    fn reload(&mut self) -> Result<(), ConfigError>;
}
