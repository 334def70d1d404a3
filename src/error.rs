//! Error handling module
//!
//! Centralized error types for the storage core.

/// Storage-wide Result type
pub type StorageResult<T> = Result<T, StorageError>;

/// Stable classification of storage failures, used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateSequence,
    BackendIoFailure,
    DeserializationFailure,
    SerializationFailure,
    NotInitialized,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateSequence => "duplicate_sequence",
            ErrorKind::BackendIoFailure => "backend_io_failure",
            ErrorKind::DeserializationFailure => "deserialization_failure",
            ErrorKind::SerializationFailure => "serialization_failure",
            ErrorKind::NotInitialized => "not_initialized",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the event log, snapshot store and storage modes
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An event with this sequence number is already in the log
    #[error("Duplicate sequence number: {seq}")]
    DuplicateSequence { seq: i64 },

    /// Database unavailable or write rejected
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File system failure (size-on-disk query, backing file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored payload does not parse into the expected shape
    #[error("Failed to deserialize {what} payload at seq {seq}: {source}")]
    Deserialization {
        what: &'static str,
        seq: i64,
        #[source]
        source: serde_json::Error,
    },

    /// A payload could not be encoded before writing
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation attempted before `initialize` completed
    #[error("Storage not initialized")]
    NotInitialized,
}

impl StorageError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::DuplicateSequence { .. } => ErrorKind::DuplicateSequence,
            StorageError::Database(_) | StorageError::Io(_) => ErrorKind::BackendIoFailure,
            StorageError::Deserialization { .. } => ErrorKind::DeserializationFailure,
            StorageError::Serialization(_) => ErrorKind::SerializationFailure,
            StorageError::NotInitialized => ErrorKind::NotInitialized,
        }
    }

    /// Check if this error is a duplicate sequence rejection
    pub fn is_duplicate_sequence(&self) -> bool {
        matches!(self, StorageError::DuplicateSequence { .. })
    }
}
