//! Benchmark Runner
//!
//! Runs every selected storage mode through the same generated workload:
//! warmup writes, timed writes, a size measurement and timed restores.

use std::path::PathBuf;
use std::time::Instant;

use crate::aggregate::{Aggregate, ProfileState};
use crate::config::Config;
use crate::db::ProfileDb;
use crate::error::{ErrorKind, StorageError};
use crate::storage::{ModeKind, StorageMode};

use super::stats::LatencySummary;
use super::{SessionGenerator, SnapshotPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub mode: ModeKind,
    /// One-based index among the timed sessions
    pub session_index: u64,
    pub write_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreRecord {
    pub mode: ModeKind,
    pub n: i64,
    pub restore_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeRecord {
    pub mode: ModeKind,
    pub sessions: u64,
    pub bytes: u64,
}

/// Everything measured for one mode
#[derive(Debug, Clone)]
pub struct ModeOutcome {
    pub mode: ModeKind,
    pub writes: Vec<WriteRecord>,
    pub restores: Vec<RestoreRecord>,
    pub size: SizeRecord,
    /// `None` for modes that do not keep history
    pub restore_consistent: Option<bool>,
}

impl ModeOutcome {
    pub fn write_latency(&self) -> LatencySummary {
        let samples: Vec<f64> = self.writes.iter().map(|r| r.write_ms).collect();
        LatencySummary::from_samples(&samples)
    }

    pub fn restore_latency(&self) -> LatencySummary {
        let samples: Vec<f64> = self.restores.iter().map(|r| r.restore_ms).collect();
        LatencySummary::from_samples(&samples)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BenchResults {
    pub modes: Vec<ModeOutcome>,
}

impl BenchResults {
    pub fn writes(&self) -> impl Iterator<Item = &WriteRecord> {
        self.modes.iter().flat_map(|m| m.writes.iter())
    }

    pub fn restores(&self) -> impl Iterator<Item = &RestoreRecord> {
        self.modes.iter().flat_map(|m| m.restores.iter())
    }

    pub fn sizes(&self) -> impl Iterator<Item = &SizeRecord> {
        self.modes.iter().map(|m| &m.size)
    }

    pub fn mode(&self, kind: ModeKind) -> Option<&ModeOutcome> {
        self.modes.iter().find(|m| m.mode == kind)
    }
}

/// Failure that aborted a benchmark run
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("Failed to prepare {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{mode}: failed to open storage ({kind}): {source}", kind = .source.kind())]
    Open {
        mode: ModeKind,
        #[source]
        source: StorageError,
    },

    #[error("{mode}: persist failed at seq {seq} ({kind}): {source}", kind = .source.kind())]
    Persist {
        mode: ModeKind,
        seq: i64,
        #[source]
        source: StorageError,
    },

    #[error("{mode}: size query failed ({kind}): {source}", kind = .source.kind())]
    Size {
        mode: ModeKind,
        #[source]
        source: StorageError,
    },

    #[error("{mode}: restore failed at upto_seq {upto_seq} ({kind}): {source}", kind = .source.kind())]
    Restore {
        mode: ModeKind,
        upto_seq: i64,
        #[source]
        source: StorageError,
    },
}

impl WorkloadError {
    /// Storage error kind, if the failure came from the storage layer
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            WorkloadError::Setup { .. } => None,
            WorkloadError::Open { source, .. }
            | WorkloadError::Size { source, .. }
            | WorkloadError::Persist { source, .. }
            | WorkloadError::Restore { source, .. } => Some(source.kind()),
        }
    }
}

/// Benchmark driver
#[derive(Debug, Clone)]
pub struct BenchRunner {
    config: Config,
    modes: Vec<ModeKind>,
}

impl BenchRunner {
    /// Runner over all three modes
    pub fn new(config: Config) -> Self {
        Self {
            config,
            modes: ModeKind::ALL.to_vec(),
        }
    }

    /// Restrict the run to `modes`
    pub fn with_modes(mut self, modes: Vec<ModeKind>) -> Self {
        self.modes = modes;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every selected mode in order
    pub async fn run(&self) -> Result<BenchResults, WorkloadError> {
        let out_dir = &self.config.out_dir;
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|source| WorkloadError::Setup {
                path: out_dir.clone(),
                source,
            })?;

        let mut results = BenchResults::default();
        for &kind in &self.modes {
            let outcome = self.run_mode(kind).await?;
            results.modes.push(outcome);
        }

        Ok(results)
    }

    /// Run one mode on a fresh database file, closing the handle on every path
    pub async fn run_mode(&self, kind: ModeKind) -> Result<ModeOutcome, WorkloadError> {
        let path = self.config.out_dir.join(kind.db_file_name());
        let stale = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| WorkloadError::Setup {
                path: path.clone(),
                source,
            })?;
        if stale {
            tracing::info!("{}: removing previous database {}", kind, path.display());
            tokio::fs::remove_file(&path)
                .await
                .map_err(|source| WorkloadError::Setup {
                    path: path.clone(),
                    source,
                })?;
        }

        let db = ProfileDb::open(&path, self.config.database_max_connections)
            .await
            .map_err(|source| WorkloadError::Open { mode: kind, source })?;

        let mut storage = StorageMode::open(kind, db);
        let outcome = self.drive(&mut storage).await;
        storage.close().await;

        if let Err(e) = &outcome {
            tracing::error!("{}", e);
        }
        outcome
    }

    /// Run the workload against an already opened storage mode
    ///
    /// The first failing persist or restore aborts the run. The caller keeps
    /// ownership of `storage` and closes it.
    pub async fn drive(&self, storage: &mut StorageMode) -> Result<ModeOutcome, WorkloadError> {
        let mode = storage.kind();
        storage
            .initialize()
            .await
            .map_err(|source| WorkloadError::Open { mode, source })?;

        let generator = SessionGenerator::new(self.config.seed);
        let policy = SnapshotPolicy::every(self.config.snapshot_every);
        let mut profile = ProfileState::create_default();

        tracing::info!("{}: warming up with {} sessions", mode, self.config.warmup);
        for index in 0..self.config.warmup {
            let event = generator.generate(index);
            profile = profile.apply(&event);
            storage
                .persist(&event, &profile, policy.is_boundary(event.seq))
                .await
                .map_err(|source| WorkloadError::Persist {
                    mode,
                    seq: event.seq,
                    source,
                })?;
        }

        tracing::info!("{}: timing {} sessions", mode, self.config.sessions);
        let mut writes = Vec::with_capacity(self.config.sessions as usize);
        for index in self.config.warmup..self.config.total_events() {
            let event = generator.generate(index);
            profile = profile.apply(&event);
            let boundary = policy.is_boundary(event.seq);

            let start = Instant::now();
            storage
                .persist(&event, &profile, boundary)
                .await
                .map_err(|source| WorkloadError::Persist {
                    mode,
                    seq: event.seq,
                    source,
                })?;
            let write_ms = start.elapsed().as_secs_f64() * 1000.0;

            let session_index = index - self.config.warmup + 1;
            writes.push(WriteRecord {
                mode,
                session_index,
                write_ms,
            });

            if session_index % 1000 == 0 {
                tracing::info!("{}: persisted {} sessions", mode, session_index);
            }
        }

        let bytes = storage
            .size_bytes()
            .await
            .map_err(|source| WorkloadError::Size { mode, source })?;
        let size = SizeRecord {
            mode,
            sessions: self.config.sessions,
            bytes,
        };

        let total = self.config.total_events() as i64;
        let mut restores = Vec::with_capacity(self.config.restore_targets.len());
        let mut restore_consistent = mode.keeps_history().then_some(true);

        for &target in &self.config.restore_targets {
            let upto_seq = target.min(total);

            let start = Instant::now();
            let restored = storage
                .restore(upto_seq)
                .await
                .map_err(|source| WorkloadError::Restore {
                    mode,
                    upto_seq,
                    source,
                })?;
            let restore_ms = start.elapsed().as_secs_f64() * 1000.0;

            restores.push(RestoreRecord {
                mode,
                n: upto_seq,
                restore_ms,
            });

            if mode.keeps_history() && restored != self.replay_in_memory(&generator, upto_seq) {
                tracing::error!("{}: restore({}) differs from in-memory replay", mode, upto_seq);
                restore_consistent = Some(false);
            }
        }

        tracing::info!("{}: done, {} bytes on disk", mode, bytes);

        Ok(ModeOutcome {
            mode,
            writes,
            restores,
            size,
            restore_consistent,
        })
    }

    /// Reference state: fold of the generated events up to `upto_seq`
    fn replay_in_memory(&self, generator: &SessionGenerator, upto_seq: i64) -> ProfileState {
        let events: Vec<_> = generator.sessions(upto_seq.max(0) as u64).collect();
        ProfileState::create_default().fold(&events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_error_reports_seq_and_kind() {
        let err = WorkloadError::Persist {
            mode: ModeKind::Hybrid,
            seq: 42,
            source: StorageError::DuplicateSequence { seq: 42 },
        };

        assert_eq!(err.kind(), Some(ErrorKind::DuplicateSequence));
        let message = err.to_string();
        assert!(message.starts_with("S3-Hybrid:"));
        assert!(message.contains("seq 42"));
        assert!(message.contains("duplicate_sequence"));
    }

    #[test]
    fn test_restore_error_reports_target_and_kind() {
        let err = WorkloadError::Restore {
            mode: ModeKind::EventSourcing,
            upto_seq: 500,
            source: StorageError::NotInitialized,
        };

        assert_eq!(err.kind(), Some(ErrorKind::NotInitialized));
        let message = err.to_string();
        assert!(message.contains("upto_seq 500"));
        assert!(message.contains("not_initialized"));
    }

    #[test]
    fn test_setup_error_has_no_storage_kind() {
        let err = WorkloadError::Setup {
            path: PathBuf::from("/nonexistent/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(err.kind(), None);
        assert!(err.to_string().contains("/nonexistent/out"));
    }
}
