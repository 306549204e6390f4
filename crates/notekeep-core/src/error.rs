//! Error types for notekeep.

use thiserror::Error;

use crate::models::{NoteId, TagId};

/// Result type alias using notekeep's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notekeep operations.
///
/// Uniqueness races on tag and association creation are not errors; the store
/// reports them through [`crate::CreateOutcome`] and [`crate::LinkOutcome`].
#[derive(Error, Debug)]
pub enum Error {
    /// The store could not be reached or timed out. Never retried here.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other database failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(TagId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for every "does not exist" flavour.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::NoteNotFound(_) | Error::TagNotFound(_)
        )
    }
}

/// SQLSTATE codes that mean the server went away rather than rejected the query.
fn is_connection_sqlstate(code: &str) -> bool {
    // Class 08: connection exception. 57P01-57P03: shutdown / cannot connect now.
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Error::StoreUnavailable(e.to_string()),
            sqlx::Error::RowNotFound => Error::NotFound("row not found".to_string()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref().is_some_and(is_connection_sqlstate) =>
            {
                Error::StoreUnavailable(e.to_string())
            }
            other => Error::Database(other),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
