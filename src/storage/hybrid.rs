//! Hybrid mode
//!
//! Event log plus the latest snapshot. Restore starts from the snapshot when
//! it is at or below the target and replays only the remaining events, so the
//! result always equals a full replay.

use crate::aggregate::ProfileState;
use crate::db::ProfileDb;
use crate::domain::{SessionEvent, PROFILE_ID};
use crate::error::StorageResult;
use crate::event_store::{EventLog, SnapshotStore};

#[derive(Debug, Clone)]
pub struct HybridStore {
    db: ProfileDb,
    events: EventLog,
    snapshots: SnapshotStore,
}

impl HybridStore {
    pub fn new(db: ProfileDb) -> Self {
        Self {
            events: EventLog::new(db.clone()),
            snapshots: SnapshotStore::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &ProfileDb {
        &self.db
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn is_initialized(&self) -> bool {
        self.events.is_initialized() && self.snapshots.is_initialized()
    }

    pub async fn initialize(&mut self) -> StorageResult<()> {
        self.events.initialize().await?;
        self.snapshots.initialize().await
    }

    /// Append the event; on a boundary also snapshot `state` at the event's seq
    pub async fn persist(
        &self,
        event: &SessionEvent,
        state: &ProfileState,
        is_snapshot_boundary: bool,
    ) -> StorageResult<()> {
        self.events.append(event).await?;

        if is_snapshot_boundary {
            self.snapshots.write(state, event.seq).await?;
        }

        Ok(())
    }

    pub async fn restore(&self, upto_seq: i64) -> StorageResult<ProfileState> {
        let snapshot = self
            .snapshots
            .read_latest_at_or_below(PROFILE_ID, upto_seq)
            .await?;

        let (base, start) = match snapshot {
            Some(snapshot) => (snapshot.decode_state()?, snapshot.upto_seq),
            None => (ProfileState::create_default(), 0),
        };

        tracing::debug!("Hybrid restore to {} starting after seq {}", upto_seq, start);

        self.events.fold_range(base, start, upto_seq).await
    }
}
