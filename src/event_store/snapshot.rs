//! Snapshot Store
//!
//! Single-slot store of the latest serialized profile state. Writing a new
//! snapshot replaces the previous one; no snapshot history is retained, so a
//! restore target below the latest `upto_seq` falls back to log replay.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::aggregate::{Aggregate, ProfileState};
use crate::db::ProfileDb;
use crate::domain::PROFILE_ID;
use crate::error::{StorageError, StorageResult};

/// Stored snapshot row
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMetadata {
    pub profile_id: String,
    /// Highest event sequence number folded into `state_json`
    pub upto_seq: i64,
    pub state_json: String,
    /// SHA-256 of `state_json`, hex encoded. Not used by restore.
    pub content_hash: String,
    pub rules_version: String,
    pub content_version: String,
    pub created_at: DateTime<Utc>,
}

impl SnapshotMetadata {
    /// Deserialize the stored state
    pub fn decode_state(&self) -> StorageResult<ProfileState> {
        ProfileState::from_json(&self.state_json).map_err(|source| StorageError::Deserialization {
            what: "snapshot",
            seq: self.upto_seq,
            source,
        })
    }

    /// Check the recorded hash against the payload
    pub fn verify_hash(&self) -> bool {
        content_hash(&self.state_json) == self.content_hash
    }
}

/// Compute the content hash of a serialized payload
pub fn content_hash(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Snapshot Store keyed by profile id
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    db: ProfileDb,
    initialized: bool,
}

impl SnapshotStore {
    /// Create a new SnapshotStore on an open database handle
    pub fn new(db: ProfileDb) -> Self {
        Self {
            db,
            initialized: false,
        }
    }

    /// Create the snapshots table if needed. Safe to call repeatedly.
    pub async fn initialize(&mut self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                profile_id TEXT PRIMARY KEY,
                upto_seq INTEGER NOT NULL,
                snapshot_json TEXT NOT NULL,
                snapshot_hash TEXT NOT NULL,
                ts TEXT NOT NULL,
                rules_version TEXT NOT NULL,
                content_version TEXT NOT NULL
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

    /// Replace the stored snapshot with `state` folded up to `upto_seq`
    ///
    /// Stored under `PROFILE_ID`, the same key the event log uses. A single
    /// upsert statement, so readers never see a partial row.
    pub async fn write(&self, state: &ProfileState, upto_seq: i64) -> StorageResult<()> {
        self.ensure_initialized()?;

        let state_json = state.to_json()?;
        let hash = content_hash(&state_json);

        sqlx::query(
            r#"
            INSERT INTO snapshots (
                profile_id, upto_seq, snapshot_json, snapshot_hash,
                ts, rules_version, content_version
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (profile_id) DO UPDATE SET
                upto_seq = excluded.upto_seq,
                snapshot_json = excluded.snapshot_json,
                snapshot_hash = excluded.snapshot_hash,
                ts = excluded.ts,
                rules_version = excluded.rules_version,
                content_version = excluded.content_version
            "#,
        )
        .bind(PROFILE_ID)
        .bind(upto_seq)
        .bind(&state_json)
        .bind(&hash)
        .bind(Utc::now())
        .bind(state.rules_version())
        .bind(state.content_version())
        .execute(self.db.pool())
        .await?;

        tracing::debug!(
            "Snapshot saved for {} {} at seq {}",
            ProfileState::aggregate_type(),
            PROFILE_ID,
            upto_seq
        );

        Ok(())
    }

    /// The stored snapshot if its `upto_seq <= upto_seq`
    pub async fn read_latest_at_or_below(
        &self,
        profile_id: &str,
        upto_seq: i64,
    ) -> StorageResult<Option<SnapshotMetadata>> {
        self.ensure_initialized()?;

        let row = sqlx::query_as::<_, (String, i64, String, String, DateTime<Utc>, String, String)>(
            r#"
            SELECT profile_id, upto_seq, snapshot_json, snapshot_hash, ts, rules_version, content_version
            FROM snapshots
            WHERE profile_id = ?1 AND upto_seq <= ?2
            "#,
        )
        .bind(profile_id)
        .bind(upto_seq)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(
            |(profile_id, upto_seq, state_json, content_hash, created_at, rules_version, content_version)| {
                SnapshotMetadata {
                    profile_id,
                    upto_seq,
                    state_json,
                    content_hash,
                    rules_version,
                    content_version,
                    created_at,
                }
            },
        ))
    }
}
