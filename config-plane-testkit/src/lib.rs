//! Shared test harness exercising [`ConfigRepo`] identically across every
//! backend (spec §8), in the spirit of a dedicated shared testing crate:
//! one set of scenarios, run against each backend's own [`RepoProvider`].
//!
//! Each backend crate's `tests/` integration test wires up the
//! corresponding provider and calls [`universal_properties`] and
//! [`merge_scenarios`].

mod providers;

use config_plane_core::{Blob, ConfigRepo, DEFAULT_BRANCH};

pub use providers::{MemoryProvider, SqlProvider, VcsProvider};

/// Produces fresh [`ConfigRepo`] handles onto one shared underlying store,
/// so that two `open()` calls for different branches (or the same branch,
/// reopened) observe each other's committed state — mirroring how a real
/// deployment has many processes pointed at one backend.
pub trait RepoProvider {
    fn open(&self, branch: &str) -> Box<dyn ConfigRepo>;
}

/// Install a `tracing` subscriber for test output; harmless to call more
/// than once across a test binary.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// The universal properties from spec §8: dirty/commit lifecycle,
/// read-your-writes, tombstone erasure, branch isolation, and the
/// branch-management error cases.
pub fn universal_properties(provider: &dyn RepoProvider) {
    dirty_after_set_clean_after_commit(provider);
    read_your_writes(provider);
    tombstone_erasure(provider);
    commit_is_noop_when_clean(provider);
    switch_forbidden_while_dirty(provider);
    switch_to_unknown_branch(provider);
    branch_isolation(provider);
    create_branch_already_exists(provider);
    create_branch_missing_source(provider);
    create_branch_never_switches(provider);
}

fn dirty_after_set_clean_after_commit(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    assert!(!repo.is_dirty().unwrap());
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    assert!(repo.is_dirty().unwrap());
    repo.commit().unwrap();
    assert!(!repo.is_dirty().unwrap());
}

fn read_your_writes(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    assert_eq!(repo.get("k").unwrap(), Some(Blob::from_static(b"v")));
    repo.commit().unwrap();
    assert_eq!(repo.get("k").unwrap(), Some(Blob::from_static(b"v")));
}

fn tombstone_erasure(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.commit().unwrap();
    repo.set("k", config_plane_core::Update::Delete).unwrap();
    repo.commit().unwrap();
    assert_eq!(repo.get("k").unwrap(), None);
}

fn commit_is_noop_when_clean(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.commit().unwrap();
    let before = repo.get("k").unwrap();
    repo.commit().unwrap();
    assert_eq!(repo.get("k").unwrap(), before);
}

fn switch_forbidden_while_dirty(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.create_branch("dev", None).unwrap();
    let err = repo.switch_branch("dev").unwrap_err();
    assert!(matches!(err, config_plane_core::ConfigError::DirtyStage { .. }));
}

fn switch_to_unknown_branch(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.commit().unwrap();
    let err = repo.switch_branch("nope").unwrap_err();
    assert!(matches!(err, config_plane_core::ConfigError::MissingBranch { .. }));
}

fn branch_isolation(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("theme", Blob::from_static(b"light").into()).unwrap();
    repo.commit().unwrap();
    repo.create_branch("dev", None).unwrap();
    repo.switch_branch("dev").unwrap();
    repo.set("theme", Blob::from_static(b"dark").into()).unwrap();
    repo.commit().unwrap();
    repo.switch_branch(DEFAULT_BRANCH).unwrap();
    assert_eq!(repo.get("theme").unwrap(), Some(Blob::from_static(b"light")));
}

fn create_branch_already_exists(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.commit().unwrap();
    repo.create_branch("dev", None).unwrap();
    let err = repo.create_branch("dev", None).unwrap_err();
    assert!(matches!(err, config_plane_core::ConfigError::BranchExists { .. }));
}

fn create_branch_missing_source(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.commit().unwrap();
    let err = repo.create_branch("dev", Some("nonexistent")).unwrap_err();
    assert!(matches!(err, config_plane_core::ConfigError::MissingBranch { .. }));
}

fn create_branch_never_switches(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"v").into()).unwrap();
    repo.commit().unwrap();
    repo.create_branch("dev", None).unwrap();
    // SPEC_FULL §9, Open Question a: create_branch never switches, on any
    // backend.
    let branches = repo.list_branches().unwrap();
    assert!(branches.iter().any(|b| b == "dev"));
    assert!(branches.iter().any(|b| b == DEFAULT_BRANCH));
}

/// The merge scenarios from spec §8 (scenarios A-D): disjoint union,
/// source-wins on conflict, deletion propagation, and self-merge being a
/// no-op.
pub fn merge_scenarios(provider: &dyn RepoProvider) {
    merge_disjoint_union(provider);
    merge_source_wins_on_conflict(provider);
    merge_deletion_propagates(provider);
}

fn merge_disjoint_union(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
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
    assert!(!repo.is_dirty().unwrap());
}

fn merge_source_wins_on_conflict(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
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

fn merge_deletion_propagates(provider: &dyn RepoProvider) {
    let mut repo = provider.open(DEFAULT_BRANCH);
    repo.set("k", Blob::from_static(b"x").into()).unwrap();
    repo.commit().unwrap();

    repo.create_branch("dev", None).unwrap();
    repo.switch_branch("dev").unwrap();
    repo.set("k", config_plane_core::Update::Delete).unwrap();
    repo.commit().unwrap();

    repo.switch_branch(DEFAULT_BRANCH).unwrap();
    repo.merge("dev").unwrap();
    assert_eq!(repo.get("k").unwrap(), None);
}
