//! Error types for the graph resolver, scheduler, and processor contract.
//!
//! All errors the core surfaces to a caller or to a task's `error` field are
//! variants of [`EngineError`]. The taxonomy follows the error-kind design of
//! the platform this engine serves: a fixed, stable set of categories rather
//! than one-off string errors, so callers can match on them.
//!
//! # Error Hierarchy
//!
//! ```text
//! EngineError
//! ├── CanvasNotFound              - snapshot loader: unknown or unowned canvas
//! ├── NodeRemovedBeforeProcessing - scheduler: node deleted mid-run
//! ├── NoProcessorForType          - scheduler: no registry entry for a node type
//! ├── MissingRequiredInput        - resolver: required edge absent
//! ├── EmptyRequiredInput          - resolver: required edge present, source value null
//! ├── MissingSourceHandle         - resolver: edge references an unknown handle
//! ├── MissingSourceNode           - resolver: edge references an unknown node
//! ├── DependencyCycleOrDeadlock   - scheduler safety net
//! ├── ProcessorFailure            - anything a processor returned or threw
//! ├── PersistenceFailure          - persistence adapter error other than not-found
//! ├── Serialization               - serde_json conversion failure
//! └── Io                          - loadMediaBuffer / storage I/O failure
//! ```
//!
//! Every task-fatal variant is meant to be stored verbatim (via `to_string()`)
//! on the owning task's `error` field; none of them are retried by the
//! scheduler itself — retrying, where it happens at all, is the concern of
//! [`crate::retry::RetryPolicy`] wrapping a single processor invocation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by the resolver, scheduler, and processor contract.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested canvas does not exist, or does not belong to the caller.
    #[error("canvas not found: {canvas_id} (user {user_id})")]
    CanvasNotFound { canvas_id: String, user_id: String },

    /// A node vanished between subgraph selection and its own execution.
    #[error("node removed before processing: {node_id}")]
    NodeRemovedBeforeProcessing { node_id: String },

    /// No processor is registered for the node's type tag.
    #[error("no processor registered for node type '{node_type}' (node {node_id})")]
    NoProcessorForType { node_id: String, node_type: String },

    /// A required input handle had no connected edge.
    #[error("missing required input on node {node_id} (handle {handle_id:?})")]
    MissingRequiredInput {
        node_id: String,
        handle_id: Option<String>,
    },

    /// A required input's source edge resolved to a null/missing value.
    #[error("required input on node {node_id} resolved to an empty value (source {source_node_id})")]
    EmptyRequiredInput {
        node_id: String,
        source_node_id: String,
    },

    /// An edge referenced a handle id that doesn't exist in the snapshot.
    #[error("edge references unknown handle: {handle_id}")]
    MissingSourceHandle { handle_id: String },

    /// An edge referenced a node id that doesn't exist in the snapshot.
    #[error("edge references unknown node: {node_id}")]
    MissingSourceNode { node_id: String },

    /// The generation loop terminated with nodes still `QUEUED`.
    #[error("dependency cycle or deadlock: {node_ids:?} never became ready")]
    DependencyCycleOrDeadlock { node_ids: Vec<String> },

    /// A processor returned `{success: false, ..}` or its future errored.
    #[error("processor failure on node {node_id}: {message}")]
    ProcessorFailure { node_id: String, message: String },

    /// A persistence-adapter write failed for a reason other than not-found.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// JSON (de)serialization failure, e.g. decoding a stored `NodeResult`.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure while loading a media buffer from object storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration failure (layered YAML loader, env expansion).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl EngineError {
    /// Convenience constructor for [`EngineError::MissingRequiredInput`].
    pub fn missing_required_input(node_id: impl Into<String>, handle_id: Option<String>) -> Self {
        Self::MissingRequiredInput {
            node_id: node_id.into(),
            handle_id,
        }
    }

    /// Convenience constructor for [`EngineError::EmptyRequiredInput`].
    pub fn empty_required_input(
        node_id: impl Into<String>,
        source_node_id: impl Into<String>,
    ) -> Self {
        Self::EmptyRequiredInput {
            node_id: node_id.into(),
            source_node_id: source_node_id.into(),
        }
    }

    /// Convenience constructor for [`EngineError::ProcessorFailure`].
    pub fn processor_failure(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessorFailure {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// True for the kinds that are safety nets rather than expected user errors.
    pub fn is_safety_net(&self) -> bool {
        matches!(self, Self::DependencyCycleOrDeadlock { .. })
    }
}
