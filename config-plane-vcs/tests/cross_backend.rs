//! Runs the shared scenario suite against the git-backed backend. Requires
//! a `git` binary on `PATH`, same as the rest of this crate's tests.

use config_plane_testkit::{merge_scenarios, universal_properties, VcsProvider};

#[test]
fn universal() {
    universal_properties(&VcsProvider::new());
}

#[test]
fn merges() {
    merge_scenarios(&VcsProvider::new());
}
