//! Batch row model for database persistence

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents one `processNodes` run.
///
/// # Timestamps
/// All timestamp fields are ISO8601 strings due to SQLite type limitations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BatchRow {
    pub id: String,
    pub canvas_id: String,
    pub user_id: String,
    pub finished_at: Option<String>,
}

impl BatchRow {
    pub fn into_batch(self) -> mediaflow_core::canvas::Batch {
        mediaflow_core::canvas::Batch {
            id: self.id,
            canvas_id: self.canvas_id,
            user_id: self.user_id,
            finished_at: self.finished_at.map(|ts| parse_timestamp(&ts)),
        }
    }
}

pub(crate) fn parse_timestamp(ts: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(ts)
        .expect("stored timestamp is valid RFC3339")
        .with_timezone(&chrono::Utc)
}
