//! Canvas snapshot data model.
//!
//! The snapshot is the unit the scheduler and resolver operate on: an
//! in-memory bundle of a canvas's nodes, typed handles, edges, and the
//! ephemeral task rows for the batch currently executing against it.
//!
//! Mutation is restricted to a single field, [`Node::result`], written
//! exactly once per node per batch by the scheduler after a processor
//! returns (see `crate::scheduler::Scheduler::install_result`). Every other
//! field is read-only for the lifetime of a batch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A semantic data type carried by a handle or an output item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Image,
    Video,
    Audio,
    Svg,
}

/// Which side of an edge a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleDirection {
    Input,
    Output,
}

/// A typed port belonging to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handle {
    pub id: String,
    pub node_id: String,
    pub direction: HandleDirection,
    pub data_types: Vec<DataType>,
    pub label: Option<String>,
    /// Tie-break order among multiple handles of the same direction on a node.
    pub order: u32,
    pub required: bool,
}

/// A persisted file reference: either a durable entity or a transient,
/// batch-scoped blob produced earlier in the same run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileData {
    Entity {
        key: String,
        bucket: String,
        mime_type: Option<String>,
    },
    Transient {
        temp_key: String,
        data_url: Option<String>,
        mime_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<f64>,
    },
}

impl FileData {
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            FileData::Entity { mime_type, .. } => mime_type.as_deref(),
            FileData::Transient { mime_type, .. } => mime_type.as_deref(),
        }
    }
}

/// The value carried by a single output item. Primitives are stored inline;
/// media is stored as an opaque [`FileData`] or, for composited media, an
/// opaque virtual-media tree the scheduler never introspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    File(FileData),
    /// An opaque tree of media operations (composition, transformation).
    /// Only processors that produced or consume this specific shape
    /// interpret it; the engine treats it as an opaque JSON blob.
    VirtualMedia(serde_json::Value),
}

/// One typed value produced on one output handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputItem {
    pub data_type: DataType,
    pub data: OutputValue,
    pub output_handle_id: Option<String>,
}

/// A group of output items produced together (e.g. one generation call that
/// yields several candidate images).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Output {
    pub items: Vec<OutputItem>,
}

/// The result a processor hands back to the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub selected_output_index: usize,
}

impl NodeResult {
    /// The currently selected output, if any.
    pub fn selected_output(&self) -> Option<&Output> {
        self.outputs.get(self.selected_output_index)
    }
}

/// Describes a node's type at the template level: its handle shapes are
/// implied by the `handles` collection, but persistence and transience are
/// template-level, not instance-level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub node_type: String,
    /// If true, this node's result is never written to the node row; it is
    /// readable only via the task row of the batch that produced it.
    pub is_transient: bool,
    pub is_terminal: bool,
}

/// One node in the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: String,
    pub name: String,
    pub config: serde_json::Value,
    pub result: Option<NodeResult>,
    /// True if the node's config changed since its last successful run.
    pub is_dirty: bool,
    pub template: Template,
}

/// A directed connection between an output handle and an input handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub source_handle_id: String,
    pub target: String,
    pub target_handle_id: String,
}

/// Status of a per-run task row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Queued,
    Executing,
    Completed,
    Failed,
}

/// Per-run record of a single node's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub node_id: String,
    pub batch_id: String,
    pub status: TaskStatus,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
    /// Present only for transient nodes, whose output lives on the task row.
    pub result: Option<NodeResult>,
}

/// The collection of tasks produced by one `processNodes` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub canvas_id: String,
    pub user_id: String,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Identity of a canvas; the scheduler only needs the id and owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub id: String,
    pub user_id: String,
}

/// The in-memory bundle a scheduler run operates on.
///
/// `tasks` is keyed by `node_id` so transient-node lookups (§4.1's
/// "task exists for that source node with a non-null result") are O(1).
#[derive(Debug, Clone)]
pub struct CanvasSnapshot {
    pub canvas: Canvas,
    pub nodes: Vec<Node>,
    pub handles: Vec<Handle>,
    pub edges: Vec<Edge>,
    pub tasks: HashMap<String, Task>,
}

impl CanvasSnapshot {
    pub fn node_index(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn handle(&self, handle_id: &str) -> Option<&Handle> {
        self.handles.iter().find(|h| h.id == handle_id)
    }

    /// Incoming edges of `node_id`, in the order they appear in `edges`.
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Outgoing edges of `node_id`.
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.source == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str, node_id: &str, dir: HandleDirection, order: u32) -> Handle {
        Handle {
            id: id.into(),
            node_id: node_id.into(),
            direction: dir,
            data_types: vec![DataType::Text],
            label: None,
            order,
            required: true,
        }
    }

    #[test]
    fn incoming_edges_filters_by_target() {
        let snapshot = CanvasSnapshot {
            canvas: Canvas {
                id: "c".into(),
                user_id: "u".into(),
            },
            nodes: vec![],
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

        let incoming: Vec<_> = snapshot.incoming_edges("b").collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source, "a");

        assert_eq!(snapshot.incoming_edges("a").count(), 0);
    }

    #[test]
    fn node_result_selected_output_defaults_to_zero() {
        let result = NodeResult {
            outputs: vec![Output { items: vec![] }, Output { items: vec![] }],
            selected_output_index: 0,
        };
        assert!(result.selected_output().is_some());
    }
}
