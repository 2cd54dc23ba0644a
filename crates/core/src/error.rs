//! Error types for RecordOps.

use thiserror::Error;

/// Result type alias using RecordOps' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for RecordOps.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Caller Errors (no side effects performed)
    // =========================================================================
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Error parsing CSV file: {0}")]
    CsvParse(String),

    // =========================================================================
    // Multi-step Errors (earlier steps already applied)
    // =========================================================================
    #[error("Import failed at row {row} after {completed} rows were saved: {cause}")]
    PartialImport {
        row: usize,
        completed: usize,
        cause: String,
    },

    // =========================================================================
    // External Dependency Errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    #[error("Operation already in progress: {0}")]
    Busy(String),

    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an authentication error.
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    /// Create a CSV parse error.
    pub fn csv_parse(msg: impl Into<String>) -> Self {
        Self::CsvParse(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a file system error.
    pub fn file_system(msg: impl Into<String>) -> Self {
        Self::FileSystem(msg.into())
    }

    /// Create a busy error.
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
