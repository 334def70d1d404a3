//! Event Log
//!
//! Append-only store of session events keyed by sequence number.

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::aggregate::Aggregate;
use crate::db::ProfileDb;
use crate::domain::{SessionEvent, PROFILE_ID};
use crate::error::{StorageError, StorageResult};

const SELECT_RANGE: &str = r#"
    SELECT seq, event_json
    FROM events
    WHERE profile_id = ?1 AND seq > ?2 AND seq <= ?3
    ORDER BY seq ASC
"#;

/// Stored event row with its persistence metadata
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub profile_id: String,
    pub seq: i64,
    pub recorded_at: DateTime<Utc>,
    pub event: SessionEvent,
}

/// Event Log for persisting and replaying session events
#[derive(Debug, Clone)]
pub struct EventLog {
    db: ProfileDb,
    initialized: bool,
}

impl EventLog {
    /// Create a new EventLog on an open database handle
    pub fn new(db: ProfileDb) -> Self {
        Self {
            db,
            initialized: false,
        }
    }

    /// Create the events table if needed. Safe to call repeatedly.
    pub async fn initialize(&mut self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                event_id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                ts TEXT NOT NULL,
                event_json TEXT NOT NULL,
                seed INTEGER NOT NULL,
                config_version TEXT NOT NULL,
                content_version TEXT NOT NULL,
                rules_version TEXT NOT NULL,
                UNIQUE (profile_id, seq)
            )
            "#,
        )
        .execute(self.db.pool())
        .await?;

        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    // =========================================================================
    // append
    // =========================================================================

    /// Append one event. Fails with `DuplicateSequence` if `seq` is taken;
    /// the log is left unchanged in that case.
    pub async fn append(&self, event: &SessionEvent) -> StorageResult<()> {
        self.ensure_initialized()?;

        let payload = serde_json::to_string(event)?;

        let result = sqlx::query(
            r#"
            INSERT INTO events (
                profile_id, seq, ts, event_json, seed,
                config_version, content_version, rules_version
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(PROFILE_ID)
        .bind(event.seq)
        .bind(Utc::now())
        .bind(&payload)
        .bind(event.seed)
        .bind(&event.config_version)
        .bind(&event.content_version)
        .bind(&event.rules_version)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => {
                tracing::debug!("Appended event seq {}", event.seq);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!("Rejected duplicate event seq {}", event.seq);
                Err(StorageError::DuplicateSequence { seq: event.seq })
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // reads
    // =========================================================================

    /// Lazily read events with `after_seq < seq <= upto_seq`, ascending
    pub fn stream_range(
        &self,
        after_seq: i64,
        upto_seq: i64,
    ) -> StorageResult<BoxStream<'_, StorageResult<SessionEvent>>> {
        self.ensure_initialized()?;

        let stream = sqlx::query_as::<_, (i64, String)>(SELECT_RANGE)
            .bind(PROFILE_ID)
            .bind(after_seq)
            .bind(upto_seq)
            .fetch(self.db.pool())
            .map(|row| -> StorageResult<SessionEvent> {
                let (seq, payload) = row?;
                decode_event(seq, &payload)
            });

        Ok(stream.boxed())
    }

    /// All events with `seq <= upto_seq`, ascending
    pub async fn read_upto(&self, upto_seq: i64) -> StorageResult<Vec<SessionEvent>> {
        self.stream_range(0, upto_seq)?.try_collect().await
    }

    /// Fold `base` over the events with `after_seq < seq <= upto_seq`
    pub async fn fold_range<A>(&self, base: A, after_seq: i64, upto_seq: i64) -> StorageResult<A>
    where
        A: Aggregate<Event = SessionEvent>,
    {
        let mut events = self.stream_range(after_seq, upto_seq)?;
        let mut state = base;
        let mut applied = 0u64;

        while let Some(event) = events.try_next().await? {
            state = state.apply(&event);
            applied += 1;
        }

        tracing::debug!(
            "Replayed {} events onto {} in ({}, {}]",
            applied,
            A::aggregate_type(),
            after_seq,
            upto_seq
        );

        Ok(state)
    }

    /// Number of stored events
    pub async fn count(&self) -> StorageResult<i64> {
        self.ensure_initialized()?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE profile_id = ?1")
            .bind(PROFILE_ID)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    /// Get all events with their metadata (for debugging/auditing)
    pub async fn get_events(&self) -> StorageResult<Vec<StoredEvent>> {
        self.ensure_initialized()?;

        let rows = sqlx::query_as::<_, (String, i64, DateTime<Utc>, String)>(
            r#"
            SELECT profile_id, seq, ts, event_json
            FROM events
            WHERE profile_id = ?1
            ORDER BY seq ASC
            "#,
        )
        .bind(PROFILE_ID)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|(profile_id, seq, recorded_at, payload)| -> StorageResult<StoredEvent> {
                Ok(StoredEvent {
                    profile_id,
                    seq,
                    recorded_at,
                    event: decode_event(seq, &payload)?,
                })
            })
            .collect()
    }
}

fn decode_event(seq: i64, payload: &str) -> StorageResult<SessionEvent> {
    serde_json::from_str(payload).map_err(|source| StorageError::Deserialization {
        what: "event",
        seq,
        source,
    })
}
