//! Storage modes
//!
//! The three ways a profile can be persisted, behind one interface:
//! - Overwrite: latest state only
//! - EventSourcing: event log only, restore replays from the start
//! - Hybrid: event log plus latest snapshot
//!
//! Callers serialize access per profile; none of these modes supports
//! concurrent writers. Failures are returned unchanged, with no retries.

mod event_sourcing;
mod hybrid;
mod overwrite;

pub use event_sourcing::EventSourcingStore;
pub use hybrid::HybridStore;
pub use overwrite::OverwriteStore;

use crate::aggregate::ProfileState;
use crate::db::ProfileDb;
use crate::domain::SessionEvent;
use crate::error::{StorageError, StorageResult};

/// Storage strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Overwrite,
    EventSourcing,
    Hybrid,
}

impl ModeKind {
    pub const ALL: [ModeKind; 3] = [ModeKind::Overwrite, ModeKind::EventSourcing, ModeKind::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Overwrite => "S1-CRUD",
            ModeKind::EventSourcing => "S2-Event",
            ModeKind::Hybrid => "S3-Hybrid",
        }
    }

    /// Database file name used by the benchmark
    pub fn db_file_name(&self) -> &'static str {
        match self {
            ModeKind::Overwrite => "s1_profile.db",
            ModeKind::EventSourcing => "s2_events.db",
            ModeKind::Hybrid => "s3_hybrid.db",
        }
    }

    /// Whether `restore(n)` reflects exactly the first `n` events
    pub fn keeps_history(&self) -> bool {
        !matches!(self, ModeKind::Overwrite)
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A storage strategy bound to its own database handle
#[derive(Debug, Clone)]
pub enum StorageMode {
    Overwrite(OverwriteStore),
    EventSourcing(EventSourcingStore),
    Hybrid(HybridStore),
}

impl StorageMode {
    /// Build the strategy around an owned handle. Call `initialize` before use.
    pub fn open(kind: ModeKind, db: ProfileDb) -> Self {
        match kind {
            ModeKind::Overwrite => StorageMode::Overwrite(OverwriteStore::new(db)),
            ModeKind::EventSourcing => StorageMode::EventSourcing(EventSourcingStore::new(db)),
            ModeKind::Hybrid => StorageMode::Hybrid(HybridStore::new(db)),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            StorageMode::Overwrite(_) => ModeKind::Overwrite,
            StorageMode::EventSourcing(_) => ModeKind::EventSourcing,
            StorageMode::Hybrid(_) => ModeKind::Hybrid,
        }
    }

    fn db(&self) -> &ProfileDb {
        match self {
            StorageMode::Overwrite(store) => store.db(),
            StorageMode::EventSourcing(store) => store.db(),
            StorageMode::Hybrid(store) => store.db(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        match self {
            StorageMode::Overwrite(store) => store.is_initialized(),
            StorageMode::EventSourcing(store) => store.is_initialized(),
            StorageMode::Hybrid(store) => store.is_initialized(),
        }
    }

    /// Create the schema. Idempotent.
    pub async fn initialize(&mut self) -> StorageResult<()> {
        let result = match self {
            StorageMode::Overwrite(store) => store.initialize().await,
            StorageMode::EventSourcing(store) => store.initialize().await,
            StorageMode::Hybrid(store) => store.initialize().await,
        };
        result?;

        tracing::info!("Initialized {} storage at {}", self.kind(), self.db().path().display());
        Ok(())
    }

    /// Persist one event together with the caller's state after applying it
    pub async fn persist(
        &self,
        event: &SessionEvent,
        state: &ProfileState,
        is_snapshot_boundary: bool,
    ) -> StorageResult<()> {
        match self {
            StorageMode::Overwrite(store) => store.persist(event, state).await,
            StorageMode::EventSourcing(store) => store.persist(event).await,
            StorageMode::Hybrid(store) => store.persist(event, state, is_snapshot_boundary).await,
        }
    }

    /// Reconstruct the profile as of `upto_seq`
    pub async fn restore(&self, upto_seq: i64) -> StorageResult<ProfileState> {
        match self {
            StorageMode::Overwrite(store) => store.restore(upto_seq).await,
            StorageMode::EventSourcing(store) => store.restore(upto_seq).await,
            StorageMode::Hybrid(store) => store.restore(upto_seq).await,
        }
    }

    /// Size on disk of the backing file
    pub async fn size_bytes(&self) -> StorageResult<u64> {
        if !self.is_initialized() {
            return Err(StorageError::NotInitialized);
        }
        self.db().size_bytes().await
    }

    /// Release the database handle
    pub async fn close(self) {
        self.db().close().await;
    }
}
