//! Runs the shared scenario suite against the in-memory backend.

use config_plane_testkit::{merge_scenarios, universal_properties, MemoryProvider};

#[test]
fn universal() {
    universal_properties(&MemoryProvider::new());
}

#[test]
fn merges() {
    merge_scenarios(&MemoryProvider::new());
}
