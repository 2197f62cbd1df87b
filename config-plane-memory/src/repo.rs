use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use config_plane_core::{Blob, ConfigError, ConfigRepo, Update, DEFAULT_BRANCH};
use tracing::{debug, info, instrument};

use crate::BranchData;

/// A committed branch map entry. `None` is a remembered tombstone: the key
/// was explicitly deleted at some point and that fact is carried forward so
/// that merges can propagate the deletion (see DESIGN.md for why the naive
/// "just remove the key" representation from the original prototype isn't
/// enough to satisfy the merge contract).
type Store = HashMap<String, BranchData>;

/// A backing store shared by every [`MemoryRepo`] constructed against it,
/// analogous to the single `dict` shared by the Python test harness's
/// `MemoryRepoProvider`.
#[derive(Clone, Default)]
pub struct SharedMemoryStore(Rc<RefCell<Store>>);

impl SharedMemoryStore {
    /// A fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with one branch's initial committed data.
    pub fn seeded(branch: impl Into<String>, data: HashMap<String, Blob>) -> Self {
        let store = Self::new();
        let data = data.into_iter().map(|(k, v)| (k, Some(v))).collect();
        store.0.borrow_mut().insert(branch.into(), data);
        store
    }
}

/// In-memory [`ConfigRepo`] implementation (spec §4.2).
pub struct MemoryRepo {
    store: SharedMemoryStore,
    branch: String,
    /// Snapshot of the current branch's committed data as of the last
    /// reload/commit; the stage's reads fall back to this.
    parent: BranchData,
    /// Pending overrides not yet committed.
    overrides: HashMap<String, Update>,
}

impl MemoryRepo {
    /// A fresh repo with its own private backing store, on `branch`.
    pub fn new(branch: impl Into<String>) -> Self {
        Self::with_store(SharedMemoryStore::new(), branch)
    }

    /// A repo bound to `branch` on `store`, which may already contain
    /// committed data (possibly shared with other `MemoryRepo` instances).
    pub fn with_store(store: SharedMemoryStore, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        store
            .0
            .borrow_mut()
            .entry(branch.clone())
            .or_insert_with(HashMap::new);
        let parent = store.0.borrow().get(&branch).cloned().unwrap_or_default();
        MemoryRepo {
            store,
            branch,
            parent,
            overrides: HashMap::new(),
        }
    }

    /// A fresh repo with its own private, unshared store on the default
    /// branch, handy for tests and the CLI's ephemeral `memory` backend.
    pub fn ephemeral() -> Self {
        Self::new(DEFAULT_BRANCH)
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.store.0.borrow().contains_key(name)
    }

    fn branch_head(&self, name: &str) -> Option<BranchData> {
        self.store.0.borrow().get(name).cloned()
    }
}

impl ConfigRepo for MemoryRepo {
    #[instrument(skip(self), level = "debug", fields(branch = %self.branch))]
    fn get(&self, key: &str) -> Result<Option<Blob>, ConfigError> {
        if let Some(update) = self.overrides.get(key) {
            return Ok(update.as_blob().cloned());
        }
        Ok(self.parent.get(key).cloned().flatten())
    }

    #[instrument(skip(self, value), level = "debug", fields(branch = %self.branch))]
    fn set(&mut self, key: &str, value: Update) -> Result<(), ConfigError> {
        self.overrides.insert(key.to_string(), value);
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool, ConfigError> {
        Ok(!self.overrides.is_empty())
    }

    #[instrument(skip(self), level = "debug", fields(branch = %self.branch))]
    fn commit(&mut self) -> Result<(), ConfigError> {
        if self.overrides.is_empty() {
            debug!("commit on clean stage is a no-op");
            return Ok(());
        }

        let mut new_head = self.parent.clone();
        for (key, update) in self.overrides.drain() {
            match update {
                Update::Set(blob) => {
                    new_head.insert(key, Some(blob));
                }
                Update::Delete => {
                    new_head.insert(key, None);
                }
            }
        }

        self.store
            .0
            .borrow_mut()
            .insert(self.branch.clone(), new_head.clone());
        self.parent = new_head;
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
        if !self.branch_exists(name) {
            return Err(ConfigError::MissingBranch {
                name: name.to_string(),
            });
        }
        self.branch = name.to_string();
        self.reload()
    }

    #[instrument(skip(self), level = "debug")]
    fn create_branch(&mut self, new: &str, from: Option<&str>) -> Result<(), ConfigError> {
        if self.branch_exists(new) {
            return Err(ConfigError::BranchExists {
                name: new.to_string(),
            });
        }

        let source = from.unwrap_or(&self.branch);
        let data = self.branch_head(source).ok_or_else(|| ConfigError::MissingBranch {
            name: source.to_string(),
        })?;

        // A fresh, independent copy: later commits on `new` or `source`
        // never affect the other (SPEC_FULL §9, Open Question b).
        self.store.0.borrow_mut().insert(new.to_string(), data);
        info!(new_branch = new, from = source, "created branch");
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.store.0.borrow().keys().cloned().collect())
    }

    #[instrument(skip(self), level = "debug")]
    fn merge(&mut self, source: &str) -> Result<(), ConfigError> {
        let source_head = self.branch_head(source).ok_or_else(|| ConfigError::MissingBranch {
            name: source.to_string(),
        })?;

        for (key, value) in source_head {
            self.overrides.insert(key, Update::from_option(value));
        }

        self.commit()?;
        info!(source, target = %self.branch, "merged");
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ConfigError> {
        self.parent = self.branch_head(&self.branch).unwrap_or_default();
        Ok(())
    }
}
