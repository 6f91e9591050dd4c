//! Error types for lift-core

use thiserror::Error;

/// Result type alias using lift-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lift-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error outside of a merge transaction
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot bytes do not parse into the expected document shape
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Snapshot was written by an incompatible schema
    #[error("Schema version mismatch (local: {expected}, remote: {found})")]
    SchemaMismatch {
        /// Version this build understands
        expected: u32,
        /// Version found in the snapshot
        found: u32,
    },

    /// Provider could not establish or validate a session
    #[error("Provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Provider transport failure during pull or push
    #[error("Provider I/O failed: {0}")]
    ProviderIo(String),

    /// Merge aborted; the local store was rolled back
    #[error("Merge transaction failed: {0}")]
    MergeTransaction(String),

    /// Another sync cycle is already running on this manager
    #[error("A sync cycle is already in progress")]
    SyncInProgress,
}
