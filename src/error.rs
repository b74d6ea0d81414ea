//! Error type for Store operations.

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::value::Value;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for Store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is absent. A control-flow condition, not a store failure.
    #[error("Key not found: {0}")]
    KeyNotFound(Value),

    #[error("Key must not be empty")]
    EmptyKey,

    /// A stored column holds something other than TEXT or BLOB.
    #[error("Column {column} holds {found}, expected text or bytes")]
    TypeMismatch { column: usize, found: String },

    /// The write lock was not acquired within the busy timeout.
    #[error("Database is locked: {source}")]
    Busy {
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this is a missing-key error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }

    /// Whether this is a lock timeout.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                tracing::debug!(error = %err, "Busy timeout elapsed waiting for lock");
                Self::Busy { source: err }
            }
            _ => match err {
                rusqlite::Error::InvalidColumnType(column, _, found) => Self::TypeMismatch {
                    column,
                    found: found.to_string(),
                },
                other => Self::Database(other),
            },
        }
    }
}
