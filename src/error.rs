//! Error types for tasuku.

use crate::domain::todo::TodoId;

/// Outcome of a rejected State Store operation.
///
/// None of these end the session: input errors are shown or ignored,
/// wiring errors are no-ops, storage and network failures leave the
/// in-memory state as it was.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("todo description is empty")]
    EmptyInput,

    #[error("todo already exists: {0}")]
    DuplicateDescription(String),

    #[error("no todo with id {0}")]
    NotFound(TodoId),

    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    #[error("network error: {0}")]
    Network(String),

    #[error("no todo ids left")]
    IdsExhausted,
}

/// Key-value adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}
