//! In-memory backend for the branched, versioned configuration store
//! (spec §4.2).
//!
//! State lives in a `branch_name -> (key -> Blob)` map held behind a shared
//! handle, so that multiple [`MemoryRepo`]s can observe the same backing
//! store the way a relational backend's database, or a VCS backend's
//! remote, is shared across repo instances. There is no persistence: the
//! store disappears when the last handle to it is dropped.

mod repo;

pub use repo::{MemoryRepo, SharedMemoryStore};

use config_plane_core::Blob;
use std::collections::HashMap;

/// The logical committed state of one branch: `key -> Blob`, where `None`
/// remembers an explicit tombstone so that merges can propagate it (see
/// [`SharedMemoryStore`]).
pub type BranchData = HashMap<String, Option<Blob>>;
