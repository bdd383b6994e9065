//! Database row models
//!
//! Core data models for persistent storage. All timestamp fields are
//! stored as ISO8601 strings (TEXT in SQLite) due to sqlx and SQLite type
//! limitations with `chrono::DateTime<Utc>`.

pub mod batch;
pub mod node;
pub mod session;
pub mod task;

pub use batch::BatchRow;
pub use node::{NodeRow, TemplateRow};
pub use session::SessionRow;
pub use task::TaskRow;
