//! # mediaflow-core - Graph execution engine for node-based media workflows
//!
//! A DAG execution engine for a node-based generative-media canvas: nodes
//! produce typed outputs (text, images, video, audio, composited media),
//! edges wire an output handle to an input handle, and a run resolves only
//! the subgraph needed to satisfy a set of target nodes.
//!
//! ## Core Concepts
//!
//! ### 1. Canvas snapshot
//!
//! [`canvas::CanvasSnapshot`] is the in-memory bundle a run operates on:
//! nodes, their typed handles, the edges between them, and the task rows
//! for the batch currently executing. It is read-only except for one seam
//! — a node's `result` field, written once per batch by the scheduler.
//!
//! ### 2. Resolver
//!
//! [`resolver`] is a set of pure functions that answer "what value feeds
//! this input handle" by walking edges and the source node's (or, for
//! transient node types, the source task's) stored result. None of them
//! mutate anything; they are safe to call concurrently from every task in
//! a generation.
//!
//! ### 3. Scheduler
//!
//! [`scheduler::Scheduler`] runs `processNodes`: it selects the subgraph a
//! target set depends on, skips nodes that are already up to date, and
//! then drives a generation loop — an indegree-gated barrier modeled on
//! the teacher's Pregel superstep, where every ready node in a generation
//! executes concurrently and the scheduler does not advance until all of
//! them finish.
//!
//! ### 4. Processor contract
//!
//! [`processor::Processor`] is the pluggable unit of work a node type
//! performs, registered by type tag in a [`processor::ProcessorRegistry`]
//! and looked up at dispatch time — the same shape as the teacher's
//! `NodeExecutor` trait.
//!
//! ### 5. Persistence
//!
//! [`persistence::Persistence`] is the narrow set of operations the
//! scheduler needs from durable storage (batches, tasks, nodes,
//! templates), modeled on the teacher's repository pattern. The concrete
//! sqlx-backed implementation lives in the `mediaflow-service` crate; this
//! crate ships only the trait and an in-memory implementation for tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mediaflow_core::persistence::InMemoryPersistence;
//! use mediaflow_core::processor::ProcessorRegistry;
//! use mediaflow_core::scheduler::Scheduler;
//! use mediaflow_core::storage::InMemoryObjectStorage;
//! use std::sync::Arc;
//!
//! # async fn run(snapshot: mediaflow_core::canvas::CanvasSnapshot, registry: ProcessorRegistry) -> mediaflow_core::error::Result<()> {
//! let scheduler = Scheduler::new(
//!     registry,
//!     Arc::new(InMemoryPersistence::new()),
//!     Arc::new(InMemoryObjectStorage::new()),
//! );
//!
//! let (batch, snapshot) = scheduler.process_nodes(snapshot, None).await?;
//! println!("batch {} finished at {:?}", batch.id, batch.finished_at);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────────────┐
//!                    │            Scheduler                │
//!                    │  • select_subgraph (reverse BFS)     │
//!                    │  • skip-rule filtering               │
//!                    │  • generation loop (indegree barrier)│
//!                    └──────────────┬──────────────────────┘
//!                                   │
//!                    ┌──────────────┴──────────────┐
//!                    ▼                             ▼
//!         ┌──────────────────────┐     ┌──────────────────────┐
//!         │      Resolver        │     │  Processor Registry  │
//!         │  • get_input_value    │────▶│  • dispatch by type   │
//!         │  • load_media_buffer  │     │  • retry on failure   │
//!         └──────────────────────┘     └──────────────────────┘
//!                    │                             │
//!                    ▼                             ▼
//!         ┌──────────────────────┐     ┌──────────────────────┐
//!         │    ObjectStorage     │     │     Persistence      │
//!         └──────────────────────┘     └──────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`canvas`] - The snapshot data model: nodes, handles, edges, tasks, batches
//! - [`resolver`] - Pure input-resolution functions over a snapshot
//! - [`storage`] - The `ObjectStorage` seam used by `load_media_buffer`
//! - [`processor`] - The `Processor` trait and its registry
//! - [`persistence`] - The durable-state trait the scheduler writes through
//! - [`scheduler`] - The generation-barrier execution loop
//! - [`retry`] - Retry policies with exponential backoff, used when invoking a processor
//! - [`error`] - The `EngineError` taxonomy shared across the crate

pub mod canvas;
pub mod error;
pub mod persistence;
pub mod processor;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod storage;

pub use canvas::{
    Batch, Canvas, CanvasSnapshot, DataType, Edge, FileData, Handle, HandleDirection, Node,
    NodeResult, Output, OutputItem, OutputValue, Task, TaskStatus, Template,
};
pub use error::{EngineError, Result};
pub use persistence::{InMemoryPersistence, Persistence};
pub use processor::{ProcessInput, ProcessOutcome, Processor, ProcessorRegistry};
pub use resolver::{
    get_all_input_values_with_handle, get_all_output_handles, get_file_data_mime_type,
    get_input_value, get_input_values_by_type, load_media_buffer, InputMatcher,
};
pub use retry::{RetryPolicy, RetryState};
pub use scheduler::Scheduler;
pub use storage::{InMemoryObjectStorage, ObjectStorage};
