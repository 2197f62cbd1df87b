//! Runs the shared scenario suite against the SQLite backend.

use config_plane_testkit::{merge_scenarios, universal_properties, SqlProvider};

#[test]
fn universal() {
    universal_properties(&SqlProvider::new());
}

#[test]
fn merges() {
    merge_scenarios(&SqlProvider::new());
}
