//! The `SessionStore` trait: the durable-state seam a session store backend
//! implements.
//!
//! Modeled on the teacher's `CheckpointSaver` trait — a narrow, named-method
//! interface rather than generic get/put — but shaped around one evolving
//! record per session instead of a version history per thread. Where the
//! teacher's `put` appends a new checkpoint and leaves prior ones readable,
//! `append_event` here folds into a single current `state` and the method
//! itself owns the atomicity: implementors must make the delta merge and
//! the `last_active_at` bump appear as one operation under concurrent
//! callers, not a separate read followed by a separate write.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{Event, Session, SessionSummary};

/// Durable storage for [`Session`] records.
///
/// ## Implementing a custom backend
///
/// ```rust,ignore
/// use mediaflow_sessions::{SessionStore, Session, Event, SessionSummary, Result};
/// use async_trait::async_trait;
///
/// struct PostgresSessionStore {
///     pool: sqlx::PgPool,
/// }
///
/// #[async_trait]
/// impl SessionStore for PostgresSessionStore {
///     async fn create(&self, user_id: &str, canvas_id: &str, session_id: Option<String>) -> Result<Session> {
///         // INSERT ... ON CONFLICT DO NOTHING, surfacing AlreadyExists on conflict
///         # unimplemented!()
///     }
///     // get / list / delete / append_event ...
///     # async fn get(&self, _: &str) -> Result<Option<Session>> { unimplemented!() }
///     # async fn list(&self, _: &str) -> Result<Vec<SessionSummary>> { unimplemented!() }
///     # async fn delete(&self, _: &str) -> Result<()> { unimplemented!() }
///     # async fn append_event(&self, _: &str, _: Event) -> Result<Session> { unimplemented!() }
/// }
/// ```
///
/// A Redis-backed implementation would typically hold the session as a
/// single serialized value under a `session:{id}` key and use `WATCH`/
/// `MULTI` or a Lua script to make `append_event` atomic; a Postgres
/// implementation would use `SELECT ... FOR UPDATE` inside a transaction.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session. If `session_id` is `Some` and a session with
    /// that id already exists (including a tombstoned one), returns
    /// [`crate::error::SessionError::AlreadyExists`].
    async fn create(
        &self,
        user_id: &str,
        canvas_id: &str,
        session_id: Option<String>,
    ) -> Result<Session>;

    /// Fetch a session by id. Returns `Ok(None)` for an unknown id and for
    /// a tombstoned one — callers cannot distinguish "never existed" from
    /// "deleted" through this method.
    async fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// List session summaries for a user, newest `last_active_at` first.
    /// Tombstoned sessions are excluded.
    async fn list(&self, user_id: &str) -> Result<Vec<SessionSummary>>;

    /// Tombstone a session: it stops appearing in `get`/`list`, but its
    /// row (and id) remain reserved rather than freed for reuse.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Append `event` to the session and fold its `state_delta` into the
    /// session's current state, returning the updated session. Must be
    /// atomic with respect to concurrent callers on the same session id —
    /// the merge-and-bump is one logical operation, not read-then-write.
    async fn append_event(&self, session_id: &str, event: Event) -> Result<Session>;
}
