//! The `sqlx`-backed [`Persistence`] implementation the scheduler writes
//! through in a real deployment, as opposed to `mediaflow-core`'s in-memory
//! one used in its own unit tests.

use async_trait::async_trait;
use chrono::Utc;

use mediaflow_core::canvas::{Batch, Node, NodeResult, Task, Template};
use mediaflow_core::error::{EngineError, Result};
use mediaflow_core::persistence::Persistence;

use crate::db::connection::DatabasePool;
use crate::db::models::task::status_to_str;
use crate::db::repositories::{BatchRepository, NodeRepository, TaskRepository, TemplateRepository};

/// Classifies a `sqlx::Error` into an `EngineError`, collapsing
/// `RowNotFound` into `PersistenceFailure` at call sites that treat a
/// missing row as an error, and leaving the `Option`-returning lookups to
/// translate `RowNotFound` into `Ok(None)` themselves (`sqlx`'s
/// `fetch_optional` already does this before the error ever reaches here).
fn classify(err: sqlx::Error) -> EngineError {
    EngineError::PersistenceFailure(err.to_string())
}

pub struct SqlitePersistence {
    pool: DatabasePool,
}

impl SqlitePersistence {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Persistence for SqlitePersistence {
    async fn create_batch(&self, canvas_id: &str, user_id: &str) -> Result<Batch> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = BatchRepository::create(&self.pool, &id, canvas_id, user_id)
            .await
            .map_err(classify)?;
        Ok(row.into_batch())
    }

    async fn create_task(&self, batch_id: &str, node_id: &str) -> Result<Task> {
        let id = uuid::Uuid::new_v4().to_string();
        let row = TaskRepository::create(&self.pool, &id, batch_id, node_id)
            .await
            .map_err(classify)?;
        row.into_task().map_err(EngineError::from)
    }

    async fn update_task(&self, task: &Task) -> Result<()> {
        let result_json = task
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        TaskRepository::update(
            &self.pool,
            &task.id,
            status_to_str(task.status),
            task.started_at.map(|ts| ts.to_rfc3339()).as_deref(),
            task.finished_at.map(|ts| ts.to_rfc3339()).as_deref(),
            task.duration_ms,
            task.error.as_deref(),
            result_json.as_deref(),
        )
        .await
        .map_err(classify)
    }

    async fn update_batch_finished_at(&self, batch_id: &str) -> Result<()> {
        let affected = BatchRepository::mark_finished(&self.pool, batch_id)
            .await
            .map_err(classify)?;
        if affected == 0 {
            return Err(EngineError::PersistenceFailure(format!(
                "batch not found: {batch_id}"
            )));
        }
        Ok(())
    }

    async fn update_node_result(&self, node_id: &str, result: &NodeResult) -> Result<()> {
        let json = serde_json::to_string(result)?;
        // A missing node affects zero rows; swallowed per trait contract.
        NodeRepository::update_result(&self.pool, node_id, &json)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn find_node_by_id(&self, node_id: &str) -> Result<Option<Node>> {
        match NodeRepository::find_by_id(&self.pool, node_id)
            .await
            .map_err(classify)?
        {
            Some(row) => Ok(Some(row.into_node()?)),
            None => Ok(None),
        }
    }

    async fn find_template_by_type(&self, node_type: &str) -> Result<Option<Template>> {
        match TemplateRepository::find_by_type(&self.pool, node_type)
            .await
            .map_err(classify)?
        {
            Some(row) => Ok(Some(row.into_template())),
            None => Ok(None),
        }
    }
}

/// Seed a node row (and its template, if not already present) so the
/// scheduler's `find_node_by_id` race-check and the resolver's reads see
/// consistent state. Not part of the `Persistence` trait — callers building
/// a canvas (e.g. the graph mutation API, out of scope here) own node
/// creation; this is the bulk-load path a test or a migration script uses.
pub async fn seed_node(pool: &DatabasePool, node: &Node) -> Result<()> {
    TemplateRepository::upsert(
        pool,
        &node.template.node_type,
        node.template.is_transient,
        node.template.is_terminal,
    )
    .await
    .map_err(classify)?;

    NodeRepository::upsert(
        pool,
        &node.id,
        &node.node_type,
        &node.name,
        &serde_json::to_string(&node.config)?,
        node.is_dirty,
    )
    .await
    .map_err(classify)?;

    if let Some(result) = &node.result {
        let json = serde_json::to_string(result)?;
        NodeRepository::update_result(pool, &node.id, &json)
            .await
            .map_err(classify)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow_core::canvas::TaskStatus;

    async fn setup_db() -> DatabasePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE batches (id TEXT PRIMARY KEY NOT NULL, canvas_id TEXT NOT NULL, user_id TEXT NOT NULL, finished_at TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE tasks (
                id TEXT PRIMARY KEY NOT NULL, node_id TEXT NOT NULL, batch_id TEXT NOT NULL,
                status TEXT NOT NULL, started_at TEXT, finished_at TEXT, duration_ms INTEGER,
                error TEXT, result TEXT
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE templates (node_type TEXT PRIMARY KEY NOT NULL, is_transient INTEGER NOT NULL, is_terminal INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE nodes (id TEXT PRIMARY KEY NOT NULL, node_type TEXT NOT NULL, name TEXT NOT NULL, config TEXT NOT NULL, result TEXT, is_dirty INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn create_batch_and_task_round_trip() {
        let pool = setup_db().await;
        let persistence = SqlitePersistence::new(pool);

        let batch = persistence.create_batch("canvas-1", "user-1").await.unwrap();
        let task = persistence.create_task(&batch.id, "node-1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Queued);

        persistence.update_batch_finished_at(&batch.id).await.unwrap();
    }

    #[tokio::test]
    async fn update_node_result_on_missing_node_is_swallowed() {
        let pool = setup_db().await;
        let persistence = SqlitePersistence::new(pool);
        let result = NodeResult {
            outputs: vec![],
            selected_output_index: 0,
        };
        assert!(persistence.update_node_result("ghost", &result).await.is_ok());
    }

    #[tokio::test]
    async fn find_node_by_id_reads_seeded_node() {
        let pool = setup_db().await;
        let node = Node {
            id: "n1".into(),
            node_type: "upscale".into(),
            name: "Upscale".into(),
            config: serde_json::json!({}),
            result: None,
            is_dirty: true,
            template: Template {
                node_type: "upscale".into(),
                is_transient: false,
                is_terminal: false,
            },
        };
        seed_node(&pool, &node).await.unwrap();

        let persistence = SqlitePersistence::new(pool);
        let fetched = persistence.find_node_by_id("n1").await.unwrap().unwrap();
        assert_eq!(fetched.node_type, "upscale");
    }
}
