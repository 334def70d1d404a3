//! Overwrite mode
//!
//! Keeps only the latest profile row; history is discarded.

use chrono::Utc;

use crate::aggregate::{Aggregate, ProfileState};
use crate::db::ProfileDb;
use crate::domain::{SessionEvent, PROFILE_ID};
use crate::error::{StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct OverwriteStore {
    db: ProfileDb,
    initialized: bool,
}

impl OverwriteStore {
    pub fn new(db: ProfileDb) -> Self {
        Self {
            db,
            initialized: false,
        }
    }

    pub fn db(&self) -> &ProfileDb {
        &self.db
    }

    pub async fn initialize(&mut self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profile (
                profile_id TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                config_version TEXT NOT NULL,
                content_version TEXT NOT NULL,
                rules_version TEXT NOT NULL,
                seed INTEGER NOT NULL
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

    /// Replace the stored row with `state`, versioned by the event's seq
    pub async fn persist(&self, event: &SessionEvent, state: &ProfileState) -> StorageResult<()> {
        self.ensure_initialized()?;

        let data_json = state.to_json()?;

        sqlx::query(
            r#"
            INSERT INTO profile (
                profile_id, version, data_json, updated_at,
                config_version, content_version, rules_version, seed
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (profile_id) DO UPDATE SET
                version = excluded.version,
                data_json = excluded.data_json,
                updated_at = excluded.updated_at,
                config_version = excluded.config_version,
                content_version = excluded.content_version,
                rules_version = excluded.rules_version,
                seed = excluded.seed
            "#,
        )
        .bind(state.id())
        .bind(event.seq)
        .bind(&data_json)
        .bind(Utc::now())
        .bind(state.config_version())
        .bind(state.content_version())
        .bind(state.rules_version())
        .bind(state.seed())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// The stored row regardless of `upto_seq`, or the default state
    pub async fn restore(&self, _upto_seq: i64) -> StorageResult<ProfileState> {
        self.ensure_initialized()?;

        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT version, data_json FROM profile WHERE profile_id = ?1")
                .bind(PROFILE_ID)
                .fetch_optional(self.db.pool())
                .await?;

        match row {
            Some((version, data_json)) => {
                ProfileState::from_json(&data_json).map_err(|source| StorageError::Deserialization {
                    what: "profile",
                    seq: version,
                    source,
                })
            }
            None => Ok(ProfileState::create_default()),
        }
    }
}
