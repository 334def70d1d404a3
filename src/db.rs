//! Database module
//!
//! Owned SQLite handle shared by the stores of one storage mode.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error::StorageResult;

/// Connection handle to one backing database file
///
/// Cloning shares the underlying pool. The handle is released by `close`.
#[derive(Debug, Clone)]
pub struct ProfileDb {
    pool: SqlitePool,
    path: PathBuf,
}

impl ProfileDb {
    /// Open (creating if missing) the database file at `path`
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Rollback journal keeps the whole store in one file for size reporting,
        // FULL sync makes each committed statement durable on return.
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::debug!("Opened database {}", path.display());

        Ok(Self { pool, path })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Simple connectivity check
    pub async fn verify_connection(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table: &str) -> StorageResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            )
            "#,
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Size on disk of the backing file
    pub async fn size_bytes(&self) -> StorageResult<u64> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        Ok(metadata.len())
    }

    /// Close all connections
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Closed database {}", self.path.display());
    }
}
