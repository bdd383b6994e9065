//! # mediaflow-sessions - Session persistence for the media canvas
//!
//! A session is the durable record of one user's interaction with one
//! canvas: an append-only log of [`session::Event`]s folded into a current
//! [`session::Session::state`]. Unlike the teacher's checkpoint store, which
//! keeps every superstep's snapshot addressable for time-travel and branch
//! replay, a session has exactly one live state — history is kept for audit,
//! not for resuming from an arbitrary past point.
//!
//! ## Core Concepts
//!
//! ### 1. SessionStore trait
//!
//! [`traits::SessionStore`] defines the persistence interface, shaped on the
//! teacher's `CheckpointSaver`: named operations (`create`, `get`, `list`,
//! `delete`, `append_event`) rather than a generic key-value surface.
//! `append_event` is the one method with an atomicity requirement — the
//! state-delta merge and the `last_active_at` bump must appear as a single
//! operation to concurrent callers.
//!
//! ### 2. Session and Event
//!
//! [`session::Session`] holds the folded `state` plus the `events` it came
//! from; [`session::Event`] is a single happening with an optional
//! `state_delta` merged shallowly into `state` on append. Sessions expire
//! after [`session::SESSION_TTL_DAYS`] of inactivity ([`session::Session::is_expired`]),
//! though the store itself never evicts on a timer — expiry is advisory,
//! left to callers to act on.
//!
//! ### 3. Tombstone deletion
//!
//! [`traits::SessionStore::delete`] marks a session deleted rather than
//! removing its row, unlike the teacher's `delete_thread`, which performs a
//! hard `HashMap` removal. A deleted session's id is never reused and the
//! row remains available to out-of-band audit tooling even though `get`/
//! `list` no longer surface it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediaflow_sessions::{Event, InMemorySessionStore, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemorySessionStore::new();
//!
//!     let session = store.create("user-1", "canvas-1", None).await?;
//!
//!     let event = Event::new("node_completed", serde_json::json!({"node_id": "n1"}))
//!         .with_state_delta(serde_json::json!({"status": "running"}));
//!     let updated = store.append_event(&session.id, event).await?;
//!     println!("session {} state: {}", updated.id, updated.state);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  mediaflow-core (Scheduler)              │
//! │  • appends an event after each batch completes           │
//! └────────────────────┬────────────────────────────────────┘
//!                      │ append_event()
//!                      ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │           SessionStore Trait (This Crate)                │
//! │  • create() / get() / list()                             │
//! │  • delete() - tombstone                                  │
//! │  • append_event() - atomic fold                           │
//! └────────────────────┬────────────────────────────────────┘
//!                      │ Implemented by
//!         ┌────────────┴────────────┬──────────────┐
//!         ▼                         ▼              ▼
//!  ┌──────────────┐    ┌─────────────────┐  ┌─────────┐
//!  │  In-Memory   │    │  PostgreSQL     │  │  Redis  │
//!  │ (Reference)  │    │ (Production)    │  │         │
//!  └──────────────┘    └─────────────────┘  └─────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - [`session::Session`], [`session::Event`], [`session::SessionSummary`]
//! - [`traits`] - [`traits::SessionStore`] trait
//! - [`memory`] - [`memory::InMemorySessionStore`] reference implementation
//! - [`error`] - [`error::SessionError`] types

pub mod error;
pub mod memory;
pub mod session;
pub mod traits;

pub use error::{Result, SessionError};
pub use memory::InMemorySessionStore;
pub use session::{Event, Session, SessionSummary, SESSION_TTL_DAYS};
pub use traits::SessionStore;
