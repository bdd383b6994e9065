//! `sqlx`-backed persistence and configuration for the workflow engine.
//!
//! This crate supplies the concrete adapters `mediaflow-core` and
//! `mediaflow-sessions` define traits for but don't implement themselves:
//! a `Persistence` backed by SQLite (`db::persistence::SqlitePersistence`),
//! a `SessionStore` backed by the same pool (`db::session_store::SqliteSessionStore`),
//! and the layered YAML configuration loader that wires a deployment's
//! database URL, pool size, log level, and retry policy into a
//! [`ServiceConfig`].
//!
//! HTTP routing, authentication, object storage, and codec work are out of
//! scope here; this crate only gets data in and out of the database.

pub mod config;
pub mod db;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration or wiring the database layer.
///
/// `mediaflow_core::error::EngineError` and `mediaflow_sessions::error::SessionError`
/// remain the error types surfaced by the engine's public API; this type is
/// local to bootstrapping this crate's own adapters.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Default exponential-backoff retry policy applied to transient database
/// errors, analogous to the teacher's HTTP client retry policy but scoped to
/// the database pool instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

/// Get version information.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy_is_reasonable() {
        let policy = RetryPolicy::default();
        assert!(policy.max_attempts > 0);
        assert!(policy.base_delay_ms > 0);
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
