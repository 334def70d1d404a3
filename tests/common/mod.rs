//! Common test utilities

#![allow(dead_code)]

use profile_store::workload::SessionGenerator;
use profile_store::{ProfileDb, SessionEvent};
use tempfile::TempDir;

/// Throw-away database file; the directory is removed when dropped
pub struct TestDb {
    pub dir: TempDir,
    pub db: ProfileDb,
}

/// Open a fresh SQLite file in a temporary directory
pub async fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = ProfileDb::open(dir.path().join("profile.db"), 1)
        .await
        .expect("Failed to open test database");

    TestDb { dir, db }
}

/// Deterministic events with seq `1..=count`
pub fn events(count: u64) -> Vec<SessionEvent> {
    SessionGenerator::new(54321).sessions(count).collect()
}
