//! profile_store Library
//!
//! Event-sourced learner profile storage: an append-only event log, a
//! single-slot snapshot store, the profile fold and three storage modes
//! built from them.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod domain;
pub mod event_store;
pub mod storage;
pub mod workload;

mod error;

pub use aggregate::{Aggregate, ProfileState};
pub use config::{Config, ConfigError};
pub use db::ProfileDb;
pub use domain::{SessionEvent, PROFILE_ID};
pub use error::{ErrorKind, StorageError, StorageResult};
pub use event_store::{EventLog, SnapshotMetadata, SnapshotStore};
pub use storage::{ModeKind, StorageMode};
