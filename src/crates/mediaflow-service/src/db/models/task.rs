//! Task row model for database persistence

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::models::batch::parse_timestamp;

/// A task row, one per node in a batch's runnable subgraph.
///
/// `result` and `error` are nullable JSON/text columns; `status` is stored
/// as its lowercase name (`queued`, `executing`, `completed`, `failed`).
///
/// # Timestamps
/// All timestamp fields are ISO8601 strings due to SQLite type limitations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub node_id: String,
    pub batch_id: String,
    pub status: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
    pub result: Option<String>,
}

impl TaskRow {
    pub fn into_task(self) -> Result<mediaflow_core::canvas::Task, serde_json::Error> {
        Ok(mediaflow_core::canvas::Task {
            id: self.id,
            node_id: self.node_id,
            batch_id: self.batch_id,
            status: status_from_str(&self.status),
            started_at: self.started_at.as_deref().map(parse_timestamp),
            finished_at: self.finished_at.as_deref().map(parse_timestamp),
            duration_ms: self.duration_ms,
            error: self.error,
            result: self
                .result
                .map(|json| serde_json::from_str(&json))
                .transpose()?,
        })
    }
}

pub(crate) fn status_to_str(status: mediaflow_core::canvas::TaskStatus) -> &'static str {
    use mediaflow_core::canvas::TaskStatus::*;
    match status {
        Queued => "queued",
        Executing => "executing",
        Completed => "completed",
        Failed => "failed",
    }
}

fn status_from_str(s: &str) -> mediaflow_core::canvas::TaskStatus {
    use mediaflow_core::canvas::TaskStatus::*;
    match s {
        "executing" => Executing,
        "completed" => Completed,
        "failed" => Failed,
        _ => Queued,
    }
}
