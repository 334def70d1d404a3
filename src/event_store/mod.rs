//! Event Store module
//!
//! Persistence layer for Event Sourcing.
//! Handles storing and retrieving events and snapshots from SQLite.

mod log;
mod snapshot;

pub use log::{EventLog, StoredEvent};
pub use snapshot::{content_hash, SnapshotMetadata, SnapshotStore};
