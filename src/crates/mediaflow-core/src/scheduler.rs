//! The generation-barrier scheduler.
//!
//! Structural analogue of the teacher's Pregel superstep loop: instead of
//! channel triggers gating readiness, a node becomes ready when every edge
//! feeding it (restricted to the selected subgraph) has been satisfied by a
//! completed predecessor in an earlier generation. Each generation is one
//! barrier — every ready node runs concurrently via `join_all`, and the
//! scheduler does not advance to the next generation until all of them
//! finish, successfully or not.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use crate::canvas::{Batch, CanvasSnapshot, Task, TaskStatus};
use crate::error::{EngineError, Result};
use crate::persistence::Persistence;
use crate::processor::{ProcessInput, ProcessOutcome, ProcessorRegistry};
use crate::retry::RetryPolicy;
use crate::storage::ObjectStorage;

/// Orchestrates one `processNodes` run against a snapshot.
pub struct Scheduler {
    registry: ProcessorRegistry,
    persistence: Arc<dyn Persistence>,
    storage: Arc<dyn ObjectStorage>,
    retry_policy: RetryPolicy,
}

impl Scheduler {
    pub fn new(
        registry: ProcessorRegistry,
        persistence: Arc<dyn Persistence>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            registry,
            persistence,
            storage,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Run the nodes needed to satisfy `target_node_ids` (or every node in
    /// the canvas, when `None`), returning the finished batch and the
    /// snapshot with every executed node's result installed.
    ///
    /// The snapshot is consumed and returned rather than borrowed mutably
    /// across awaits: ownership moves into the scheduler for the duration
    /// of the run, the same way a value moves through `join_all` rather
    /// than being shared behind a lock.
    pub async fn process_nodes(
        &self,
        mut snapshot: CanvasSnapshot,
        target_node_ids: Option<Vec<String>>,
    ) -> Result<(Batch, CanvasSnapshot)> {
        let targets: Vec<String> = match target_node_ids {
            Some(ids) => ids,
            None => snapshot.nodes.iter().map(|n| n.id.clone()).collect(),
        };

        for id in &targets {
            if snapshot.node(id).is_none() {
                return Err(EngineError::NodeRemovedBeforeProcessing {
                    node_id: id.clone(),
                });
            }
        }

        let target_set: HashSet<String> = targets.iter().cloned().collect();
        let necessary = select_subgraph(&snapshot, &targets);

        let batch = self
            .persistence
            .create_batch(&snapshot.canvas.id, &snapshot.canvas.user_id)
            .await?;

        // Every node in the necessary subgraph gets a persisted task row,
        // including ones the skip rule below will immediately complete
        // without invoking a processor.
        for node_id in &necessary {
            let task = self.persistence.create_task(&batch.id, node_id).await?;
            snapshot.tasks.insert(node_id.clone(), task);
        }

        let mut indegree: HashMap<String, usize> = necessary
            .iter()
            .map(|node_id| {
                let count = snapshot
                    .incoming_edges(node_id)
                    .filter(|e| necessary.contains(&e.source))
                    .count();
                (node_id.clone(), count)
            })
            .collect();

        let mut remaining: HashSet<String> = necessary.clone();

        while !remaining.is_empty() {
            let ready: Vec<String> = remaining
                .iter()
                .filter(|id| indegree[*id] == 0)
                .cloned()
                .collect();

            if ready.is_empty() {
                return self.fail_deadlocked(&mut snapshot, remaining, &batch).await;
            }

            tracing::debug!(generation_size = ready.len(), "starting generation");

            let finished = futures::future::join_all(
                ready
                    .iter()
                    .map(|node_id| self.execute_node(&snapshot, node_id, target_set.contains(node_id))),
            )
            .await;

            for (task, installable_result) in finished {
                if let Some(result) = installable_result {
                    if let Some(index) = snapshot.node_index(&task.node_id) {
                        snapshot.nodes[index].result = Some(result);
                    }
                }
                snapshot.tasks.insert(task.node_id.clone(), task);
            }

            for node_id in &ready {
                remaining.remove(node_id);
                for edge in snapshot.outgoing_edges(node_id) {
                    if let Some(count) = indegree.get_mut(&edge.target) {
                        *count = count.saturating_sub(1);
                    }
                }
            }
        }

        tracing::info!(batch_id = %batch.id, "generation loop complete");
        self.persistence.update_batch_finished_at(&batch.id).await?;
        let mut finished_batch = batch;
        finished_batch.finished_at = Some(chrono::Utc::now());

        Ok((finished_batch, snapshot))
    }

    async fn fail_deadlocked(
        &self,
        snapshot: &mut CanvasSnapshot,
        remaining: HashSet<String>,
        batch: &Batch,
    ) -> Result<(Batch, CanvasSnapshot)> {
        let node_ids: Vec<String> = remaining.into_iter().collect();
        tracing::error!(?node_ids, "dependency cycle or deadlock detected");

        for node_id in &node_ids {
            if let Some(task) = snapshot.tasks.get_mut(node_id) {
                task.status = TaskStatus::Failed;
                task.error = Some("dependency cycle or deadlock".to_string());
                let _ = self.persistence.update_task(task).await;
            }
        }
        let _ = self.persistence.update_batch_finished_at(&batch.id).await;

        Err(EngineError::DependencyCycleOrDeadlock { node_ids })
    }

    /// Run a single node's 8-step execution: confirm it still exists,
    /// dispatch to its registered processor, invoke it under the retry
    /// policy, install and persist its result, and finalize its task row.
    /// Failures never propagate out of this function — they are recorded
    /// on the returned task, so a sibling generation member's failure
    /// never aborts the run.
    ///
    /// A node that is clean, already has a result, and wasn't itself
    /// requested as a target is skipped: its task is marked completed with
    /// `duration_ms` near zero and its existing result is left untouched,
    /// without the processor ever being invoked.
    ///
    /// Returns the finalized task, plus the new result to install on the
    /// in-memory node when the node is non-transient (transient nodes carry
    /// their result on the task itself, via `task.result`).
    async fn execute_node(
        &self,
        snapshot: &CanvasSnapshot,
        node_id: &str,
        is_target: bool,
    ) -> (Task, Option<crate::canvas::NodeResult>) {
        let mut task = snapshot
            .tasks
            .get(node_id)
            .cloned()
            .expect("task row created for every necessary node before the generation loop");

        let node = snapshot.node(node_id).expect("subgraph node exists");
        if !is_target && !node.is_dirty && node.result.is_some() {
            task.status = TaskStatus::Completed;
            task.started_at = Some(chrono::Utc::now());
            task.finished_at = task.started_at;
            task.duration_ms = Some(0);
            let _ = self.persistence.update_task(&task).await;
            return (task, None);
        }

        task.status = TaskStatus::Executing;
        task.started_at = Some(chrono::Utc::now());
        let _ = self.persistence.update_task(&task).await;

        let start = Instant::now();
        let outcome = self.run_with_retry(snapshot, node_id).await;
        task.duration_ms = Some(start.elapsed().as_millis() as i64);
        task.finished_at = Some(chrono::Utc::now());

        let mut installable_result = None;

        match outcome {
            Ok(outcome) if outcome.success => {
                task.status = TaskStatus::Completed;
                if let Some(new_result) = outcome.new_result {
                    let is_transient = snapshot
                        .node(node_id)
                        .map(|n| n.template.is_transient)
                        .unwrap_or(false);
                    if is_transient {
                        task.result = Some(new_result);
                    } else {
                        if let Err(err) =
                            self.persistence.update_node_result(node_id, &new_result).await
                        {
                            tracing::warn!(node_id, %err, "failed to persist node result");
                        }
                        installable_result = Some(new_result);
                    }
                }
            }
            Ok(outcome) => {
                task.status = TaskStatus::Failed;
                task.error = Some(
                    outcome
                        .error
                        .unwrap_or_else(|| "processor reported failure".to_string()),
                );
            }
            Err(err) => {
                tracing::warn!(node_id, %err, "node execution failed");
                task.status = TaskStatus::Failed;
                task.error = Some(err.to_string());
            }
        }

        let _ = self.persistence.update_task(&task).await;
        (task, installable_result)
    }

    async fn run_with_retry(
        &self,
        snapshot: &CanvasSnapshot,
        node_id: &str,
    ) -> Result<ProcessOutcome> {
        if snapshot.node(node_id).is_none() {
            return Err(EngineError::NodeRemovedBeforeProcessing {
                node_id: node_id.to_string(),
            });
        }
        // Re-confirm against the durable store: the in-memory snapshot was
        // taken at the start of the run and could be stale if the node was
        // deleted concurrently.
        if self.persistence.find_node_by_id(node_id).await?.is_none() {
            return Err(EngineError::NodeRemovedBeforeProcessing {
                node_id: node_id.to_string(),
            });
        }

        let node = snapshot.node(node_id).expect("checked above");
        let processor = self.registry.require(node_id, &node.node_type)?;

        let mut attempt = 0;
        loop {
            let input = ProcessInput {
                node,
                snapshot,
                canvas_id: &snapshot.canvas.id,
                user_id: &snapshot.canvas.user_id,
            };

            match processor.process(input).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if self.retry_policy.should_retry(attempt) => {
                    tracing::warn!(node_id, attempt, %err, "retrying node after processor error");
                    tokio::time::sleep(self.retry_policy.calculate_delay(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Select every node reachable from `targets` by walking edges backwards
/// (a target's transitive upstream dependencies), via BFS over the reverse
/// adjacency relation.
fn select_subgraph(snapshot: &CanvasSnapshot, targets: &[String]) -> HashSet<String> {
    let mut selected: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = targets.iter().cloned().collect();

    while let Some(node_id) = queue.pop_front() {
        if !selected.insert(node_id.clone()) {
            continue;
        }
        for edge in snapshot.incoming_edges(&node_id) {
            if !selected.contains(&edge.source) {
                queue.push_back(edge.source.clone());
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, DataType, Edge, Handle, HandleDirection, Node, NodeResult, Output, OutputItem, OutputValue, Template};
    use crate::persistence::InMemoryPersistence;
    use crate::processor::Processor;
    use crate::storage::InMemoryObjectStorage;
    use async_trait::async_trait;

    struct UppercaseProcessor;

    #[async_trait]
    impl Processor for UppercaseProcessor {
        async fn process(&self, input: ProcessInput<'_>) -> Result<ProcessOutcome> {
            let value = crate::resolver::get_all_input_values_with_handle(input.snapshot, &input.node.id)?;
            let text = value
                .into_iter()
                .find_map(|(_, v)| match v {
                    Some(OutputValue::Text(t)) => Some(t),
                    _ => None,
                })
                .unwrap_or_default();

            Ok(ProcessOutcome::ok(NodeResult {
                outputs: vec![Output {
                    items: vec![OutputItem {
                        data_type: DataType::Text,
                        data: OutputValue::Text(text.to_uppercase()),
                        output_handle_id: Some(format!("{}-out", input.node.id)),
                    }],
                }],
                selected_output_index: 0,
            }))
        }
    }

    struct AlwaysFailsProcessor;

    #[async_trait]
    impl Processor for AlwaysFailsProcessor {
        async fn process(&self, _input: ProcessInput<'_>) -> Result<ProcessOutcome> {
            Ok(ProcessOutcome::failed("boom"))
        }
    }

    fn handle(id: &str, node_id: &str, dir: HandleDirection, order: u32) -> Handle {
        Handle {
            id: id.into(),
            node_id: node_id.into(),
            direction: dir,
            data_types: vec![DataType::Text],
            label: None,
            order,
            required: dir == HandleDirection::Input,
        }
    }

    fn node(id: &str, node_type: &str) -> Node {
        Node {
            id: id.into(),
            node_type: node_type.into(),
            name: id.into(),
            config: serde_json::json!({}),
            result: None,
            is_dirty: true,
            template: Template {
                node_type: node_type.into(),
                is_transient: false,
                is_terminal: false,
            },
        }
    }

    fn source_result(text: &str, handle_id: &str) -> NodeResult {
        NodeResult {
            outputs: vec![Output {
                items: vec![OutputItem {
                    data_type: DataType::Text,
                    data: OutputValue::Text(text.to_string()),
                    output_handle_id: Some(handle_id.to_string()),
                }],
            }],
            selected_output_index: 0,
        }
    }

    fn scheduler() -> Scheduler {
        let mut registry = ProcessorRegistry::new();
        registry.register("uppercase", Arc::new(UppercaseProcessor));
        registry.register("fails", Arc::new(AlwaysFailsProcessor));
        Scheduler::new(
            registry,
            Arc::new(InMemoryPersistence::new()),
            Arc::new(InMemoryObjectStorage::new()),
        )
    }

    #[tokio::test]
    async fn two_node_chain_runs_in_two_generations() {
        let mut source = node("a", "uppercase");
        source.result = Some(source_result("hi", "h-out-a"));
        source.is_dirty = false;

        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![source, node("b", "uppercase")],
            handles: vec![
                handle("h-out-a", "a", HandleDirection::Output, 0),
                handle("h-in-b", "b", HandleDirection::Input, 0),
            ],
            edges: vec![Edge {
                source: "a".into(),
                source_handle_id: "h-out-a".into(),
                target: "b".into(),
                target_handle_id: "h-in-b".into(),
            }],
            tasks: HashMap::new(),
        };

        let (_batch, snapshot) = scheduler()
            .process_nodes(snapshot, Some(vec!["b".to_string()]))
            .await
            .unwrap();

        let task_b = snapshot.tasks.get("b").unwrap();
        assert_eq!(task_b.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn clean_non_target_node_is_skipped() {
        let mut clean = node("a", "uppercase");
        clean.is_dirty = false;
        clean.result = Some(source_result("already-done", "h-out-a"));

        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![clean],
            handles: vec![handle("h-out-a", "a", HandleDirection::Output, 0)],
            edges: vec![],
            tasks: HashMap::new(),
        };

        let (_batch, snapshot) = scheduler().process_nodes(snapshot, None).await.unwrap();
        let task = snapshot.tasks.get("a").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.duration_ms, Some(0));
        let node = snapshot.node("a").unwrap();
        assert!(matches!(
            node.result.as_ref().unwrap().outputs[0].items[0].data,
            OutputValue::Text(ref t) if t == "already-done"
        ));
    }

    #[tokio::test]
    async fn target_node_always_runs_even_when_clean() {
        let mut clean = node("a", "uppercase");
        clean.is_dirty = false;
        clean.result = Some(source_result("already-done", "h-out-a"));

        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![clean],
            handles: vec![handle("h-out-a", "a", HandleDirection::Output, 0)],
            edges: vec![],
            tasks: HashMap::new(),
        };

        let (_batch, snapshot) = scheduler()
            .process_nodes(snapshot, Some(vec!["a".to_string()]))
            .await
            .unwrap();
        assert!(snapshot.tasks.get("a").is_some());
    }

    #[tokio::test]
    async fn missing_processor_fails_only_that_node() {
        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![node("a", "no-such-processor")],
            handles: vec![],
            edges: vec![],
            tasks: HashMap::new(),
        };

        let (_batch, snapshot) = scheduler().process_nodes(snapshot, None).await.unwrap();
        let task = snapshot.tasks.get("a").unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.as_deref().unwrap().contains("no-such-processor"));
    }

    #[tokio::test]
    async fn processor_failure_fails_downstream_via_empty_required_input() {
        let failing = node("a", "fails");
        let mut downstream = node("b", "uppercase");
        downstream.is_dirty = true;

        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![failing, downstream],
            handles: vec![
                handle("h-out-a", "a", HandleDirection::Output, 0),
                handle("h-in-b", "b", HandleDirection::Input, 0),
            ],
            edges: vec![Edge {
                source: "a".into(),
                source_handle_id: "h-out-a".into(),
                target: "b".into(),
                target_handle_id: "h-in-b".into(),
            }],
            tasks: HashMap::new(),
        };

        let (_batch, snapshot) = scheduler().process_nodes(snapshot, None).await.unwrap();
        assert_eq!(snapshot.tasks.get("a").unwrap().status, TaskStatus::Failed);
        assert_eq!(snapshot.tasks.get("b").unwrap().status, TaskStatus::Failed);
    }
}
