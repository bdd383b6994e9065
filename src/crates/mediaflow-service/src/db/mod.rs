//! Database module for the service crate.
//!
//! Provides database connectivity, row models, repositories, and the
//! concrete `sqlx`-backed adapters for `mediaflow_core::persistence::Persistence`
//! and `mediaflow_sessions::SessionStore`.

pub mod connection;
pub mod error;
pub mod models;
pub mod persistence;
pub mod repositories;
pub mod session_store;

pub use connection::{DatabaseConnection, DatabasePool, PoolStatistics};
pub use error::{DatabaseError, DbResult};
pub use persistence::SqlitePersistence;
pub use session_store::SqliteSessionStore;
