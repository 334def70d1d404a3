//! Event sourcing mode
//!
//! Keeps only the event log; restore replays from the first event.

use crate::aggregate::ProfileState;
use crate::db::ProfileDb;
use crate::domain::SessionEvent;
use crate::error::StorageResult;
use crate::event_store::EventLog;

#[derive(Debug, Clone)]
pub struct EventSourcingStore {
    db: ProfileDb,
    events: EventLog,
}

impl EventSourcingStore {
    pub fn new(db: ProfileDb) -> Self {
        Self {
            events: EventLog::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &ProfileDb {
        &self.db
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn is_initialized(&self) -> bool {
        self.events.is_initialized()
    }

    pub async fn initialize(&mut self) -> StorageResult<()> {
        self.events.initialize().await
    }

    pub async fn persist(&self, event: &SessionEvent) -> StorageResult<()> {
        self.events.append(event).await
    }

    pub async fn restore(&self, upto_seq: i64) -> StorageResult<ProfileState> {
        self.events
            .fold_range(ProfileState::create_default(), 0, upto_seq)
            .await
    }
}
