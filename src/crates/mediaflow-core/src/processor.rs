//! The processor contract: the pluggable unit of work a node type runs.
//!
//! Modeled directly on the teacher's `NodeExecutor` trait — an object-safe,
//! `async_trait` interface implementors register under a type tag, looked
//! up by the scheduler at dispatch time rather than bound at compile time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::canvas::{CanvasSnapshot, Node, NodeResult};
use crate::error::{EngineError, Result};

/// What a processor hands back to the scheduler after running a node.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub new_result: Option<NodeResult>,
}

impl ProcessOutcome {
    pub fn ok(new_result: NodeResult) -> Self {
        Self {
            success: true,
            error: None,
            new_result: Some(new_result),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            new_result: None,
        }
    }
}

/// Everything a processor needs to do its work: the node instance, the
/// snapshot it was resolved from (so it can call the resolver functions
/// itself for any input beyond the ones the scheduler already gathered),
/// and the owning canvas/user identity for scoping side effects.
pub struct ProcessInput<'a> {
    pub node: &'a Node,
    pub snapshot: &'a CanvasSnapshot,
    pub canvas_id: &'a str,
    pub user_id: &'a str,
}

/// The unit of work a node type performs. Implementors are registered in a
/// [`ProcessorRegistry`] under the node type tag they handle.
///
/// A failed future is treated the same as a `{success: false}` outcome by
/// the scheduler (see `crate::scheduler::Scheduler::invoke_processor`):
/// both land on the task's `error` field and stop that node's branch.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, input: ProcessInput<'_>) -> Result<ProcessOutcome>;
}

/// A static, type-tag-keyed registry of processors.
///
/// Construction is upfront (mirrors the teacher's `PregelLoop` node map):
/// register every processor before the first `processNodes` call, then
/// treat the registry as read-only for the engine's lifetime.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node_type: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(node_type.into(), processor);
    }

    pub fn get(&self, node_type: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(node_type).cloned()
    }

    pub fn require(&self, node_id: &str, node_type: &str) -> Result<Arc<dyn Processor>> {
        self.get(node_type)
            .ok_or_else(|| EngineError::NoProcessorForType {
                node_id: node_id.to_string(),
                node_type: node_type.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Template};
    use std::collections::HashMap as StdHashMap;

    struct EchoProcessor;

    #[async_trait]
    impl Processor for EchoProcessor {
        async fn process(&self, _input: ProcessInput<'_>) -> Result<ProcessOutcome> {
            Ok(ProcessOutcome::ok(NodeResult {
                outputs: vec![],
                selected_output_index: 0,
            }))
        }
    }

    #[tokio::test]
    async fn registry_dispatches_by_node_type() {
        let mut registry = ProcessorRegistry::new();
        registry.register("echo", Arc::new(EchoProcessor));

        let node = Node {
            id: "n1".into(),
            node_type: "echo".into(),
            name: "n1".into(),
            config: serde_json::json!({}),
            result: None,
            is_dirty: true,
            template: Template {
                node_type: "echo".into(),
                is_transient: false,
                is_terminal: false,
            },
        };
        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![],
            handles: vec![],
            edges: vec![],
            tasks: StdHashMap::new(),
        };

        let processor = registry.require("n1", "echo").unwrap();
        let outcome = processor
            .process(ProcessInput {
                node: &node,
                snapshot: &snapshot,
                canvas_id: "c",
                user_id: "u",
            })
            .await
            .unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn missing_processor_errors() {
        let registry = ProcessorRegistry::new();
        let err = registry.require("n1", "missing-type").unwrap_err();
        assert!(matches!(err, EngineError::NoProcessorForType { .. }));
    }
}
