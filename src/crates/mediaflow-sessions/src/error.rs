//! Error types for session store operations

use thiserror::Error;

/// Result type for session store operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while creating, reading, or mutating a session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not found
    #[error("session not found: {0}")]
    NotFound(String),

    /// An explicit session id was supplied to `create` and already exists
    #[error("session already exists: {0}")]
    AlreadyExists(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend error
    #[error("storage error: {0}")]
    Storage(String),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}
