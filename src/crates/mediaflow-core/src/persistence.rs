//! The persistence seam the scheduler writes batch/task/node state through.
//!
//! Grounded in the teacher's repository pattern (`TaskRepository`,
//! `SessionRepository`): a trait of narrow, named operations rather than a
//! generic CRUD interface, so the scheduler's call sites read like the
//! operations they are (`create_task`, not `insert("tasks", ..)`). The
//! concrete sqlx-backed implementation lives in the service crate; this
//! crate only depends on the trait and ships an in-memory implementation
//! for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::canvas::{Batch, NodeResult, Task, Template};
use crate::error::{EngineError, Result};

/// Durable state the scheduler reads and writes across a `processNodes` run.
///
/// `update_node_result` is the one operation the scheduler calls for every
/// non-transient node regardless of whether a prior row exists; a `NotFound`
/// on that path is swallowed by the implementation rather than surfaced,
/// mirroring upsert semantics without requiring every backend to implement
/// a literal upsert.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn create_batch(&self, canvas_id: &str, user_id: &str) -> Result<Batch>;

    async fn create_task(&self, batch_id: &str, node_id: &str) -> Result<Task>;

    async fn update_task(&self, task: &Task) -> Result<()>;

    async fn update_batch_finished_at(&self, batch_id: &str) -> Result<()>;

    /// Persist `result` as the node's durable result. No-op (not an error)
    /// if the node no longer exists — see [`EngineError::NodeRemovedBeforeProcessing`]
    /// for the scheduler-level handling of that race.
    async fn update_node_result(&self, node_id: &str, result: &NodeResult) -> Result<()>;

    async fn find_node_by_id(&self, node_id: &str) -> Result<Option<crate::canvas::Node>>;

    async fn find_template_by_type(&self, node_type: &str) -> Result<Option<Template>>;
}

/// An in-memory [`Persistence`] backing store for tests and local runs.
#[derive(Default)]
pub struct InMemoryPersistence {
    batches: RwLock<HashMap<String, Batch>>,
    tasks: RwLock<HashMap<String, Task>>,
    nodes: RwLock<HashMap<String, crate::canvas::Node>>,
    templates: RwLock<HashMap<String, Template>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a node so `find_node_by_id` can see it; used by tests that
    /// build a snapshot and the backing store from the same fixtures.
    pub async fn seed_node(&self, node: crate::canvas::Node) {
        self.nodes.write().await.insert(node.id.clone(), node);
    }

    pub async fn seed_template(&self, template: Template) {
        self.templates
            .write()
            .await
            .insert(template.node_type.clone(), template);
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn create_batch(&self, canvas_id: &str, user_id: &str) -> Result<Batch> {
        let batch = Batch {
            id: uuid::Uuid::new_v4().to_string(),
            canvas_id: canvas_id.to_string(),
            user_id: user_id.to_string(),
            finished_at: None,
        };
        self.batches
            .write()
            .await
            .insert(batch.id.clone(), batch.clone());
        Ok(batch)
    }

    async fn create_task(&self, batch_id: &str, node_id: &str) -> Result<Task> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            node_id: node_id.to_string(),
            batch_id: batch_id.to_string(),
            status: crate::canvas::TaskStatus::Queued,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            error: None,
            result: None,
        };
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update_task(&self, task: &Task) -> Result<()> {
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update_batch_finished_at(&self, batch_id: &str) -> Result<()> {
        let mut batches = self.batches.write().await;
        match batches.get_mut(batch_id) {
            Some(batch) => {
                batch.finished_at = Some(chrono::Utc::now());
                Ok(())
            }
            None => Err(EngineError::PersistenceFailure(format!(
                "batch not found: {batch_id}"
            ))),
        }
    }

    async fn update_node_result(&self, node_id: &str, result: &NodeResult) -> Result<()> {
        let mut nodes = self.nodes.write().await;
        if let Some(node) = nodes.get_mut(node_id) {
            node.result = Some(result.clone());
        }
        // Missing node: swallowed, per trait contract.
        Ok(())
    }

    async fn find_node_by_id(&self, node_id: &str) -> Result<Option<crate::canvas::Node>> {
        Ok(self.nodes.read().await.get(node_id).cloned())
    }

    async fn find_template_by_type(&self, node_type: &str) -> Result<Option<Template>> {
        Ok(self.templates.read().await.get(node_type).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_node_result_on_missing_node_is_swallowed() {
        let store = InMemoryPersistence::new();
        let result = NodeResult {
            outputs: vec![],
            selected_output_index: 0,
        };
        assert!(store.update_node_result("ghost", &result).await.is_ok());
    }

    #[tokio::test]
    async fn create_batch_then_finish_round_trips() {
        let store = InMemoryPersistence::new();
        let batch = store.create_batch("canvas-1", "user-1").await.unwrap();
        assert!(batch.finished_at.is_none());

        store.update_batch_finished_at(&batch.id).await.unwrap();
        let batches = store.batches.read().await;
        assert!(batches.get(&batch.id).unwrap().finished_at.is_some());
    }

    #[tokio::test]
    async fn finishing_unknown_batch_errors() {
        let store = InMemoryPersistence::new();
        let err = store.update_batch_finished_at("missing").await.unwrap_err();
        assert!(matches!(err, EngineError::PersistenceFailure(_)));
    }
}
