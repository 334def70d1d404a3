//! Workload module
//!
//! Drives the storage modes through identical write/restore workloads.

pub mod generator;
pub mod report;
pub mod runner;
pub mod stats;

pub use generator::SessionGenerator;
pub use runner::{BenchResults, BenchRunner, ModeOutcome, RestoreRecord, SizeRecord, WorkloadError, WriteRecord};
pub use stats::{percentile, LatencySummary};

/// Caller-side rule deciding which events are snapshot boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    every: u64,
}

impl SnapshotPolicy {
    /// Boundary at every `every`-th sequence number; 0 disables snapshots
    pub fn every(every: u64) -> Self {
        Self { every }
    }

    pub fn is_boundary(&self, seq: i64) -> bool {
        self.every > 0 && seq > 0 && (seq as u64) % self.every == 0
    }
}
