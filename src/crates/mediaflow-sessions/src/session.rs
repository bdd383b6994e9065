//! The session data model: an evolving record of a user's interaction with
//! one canvas, folded from an append-only event log rather than versioned
//! like the teacher's per-superstep checkpoints — a session has exactly one
//! current state, not a lineage of historical ones.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a session may go without activity before it is considered
/// expired. Expiry is advisory — callers decide whether to treat an
/// expired session as absent; the store itself never evicts on a timer.
pub const SESSION_TTL_DAYS: i64 = 30;

/// A single recorded happening within a session: a user action, a node
/// completing, an error — anything worth replaying. `state_delta`, when
/// present, is merged into the session's `state` object as a shallow
/// key-wise overwrite when the event is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub kind: String,
    pub payload: serde_json::Value,
    pub state_delta: Option<serde_json::Value>,
}

impl Event {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts: Utc::now(),
            kind: kind.into(),
            payload,
            state_delta: None,
        }
    }

    pub fn with_state_delta(mut self, delta: serde_json::Value) -> Self {
        self.state_delta = Some(delta);
        self
    }
}

/// An evolving per-canvas-per-user record: the folded `state` plus the
/// ordered `events` it was folded from. `deleted` is a tombstone rather
/// than a hard delete — unlike the teacher's `delete_thread`, which
/// removes the thread's entry outright, a deleted session keeps its row
/// (and its id unreusable) but is invisible to `get`/`list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub canvas_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub state: serde_json::Value,
    pub events: Vec<Event>,
    pub deleted: bool,
}

impl Session {
    pub fn new(id: String, canvas_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            canvas_id: canvas_id.into(),
            user_id: user_id.into(),
            created_at: now,
            last_active_at: now,
            state: serde_json::json!({}),
            events: Vec::new(),
            deleted: false,
        }
    }

    /// Fold `event`'s `state_delta` (if any) into `state` and bump
    /// `last_active_at`. Shallow merge: top-level keys in the delta
    /// overwrite the same keys in `state`, other keys are untouched — except
    /// a tombstone value (`{"__del__": true}`), which removes the key
    /// instead of storing it.
    pub fn apply(&mut self, event: Event) {
        self.last_active_at = event.ts;
        if let Some(delta) = &event.state_delta {
            if let (Some(state_obj), Some(delta_obj)) = (self.state.as_object_mut(), delta.as_object())
            {
                for (key, value) in delta_obj {
                    if is_tombstone(value) {
                        state_obj.remove(key);
                    } else {
                        state_obj.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        self.events.push(event);
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() - self.last_active_at > Duration::days(SESSION_TTL_DAYS)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            canvas_id: self.canvas_id.clone(),
            user_id: self.user_id.clone(),
            created_at: self.created_at,
            last_active_at: self.last_active_at,
        }
    }
}

/// A state-delta entry of the form `{"__del__": true}` deletes its key
/// rather than overwriting it, distinct from `Session::deleted`, which
/// tombstones a whole session.
fn is_tombstone(value: &serde_json::Value) -> bool {
    value.get("__del__") == Some(&serde_json::Value::Bool(true))
}

/// The lightweight projection of a [`Session`] returned by `list` — no
/// state, no event log, so listing a user's sessions never requires
/// loading their full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub canvas_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_merges_state_delta_and_bumps_last_active() {
        let mut session = Session::new("s1".into(), "canvas-1", "user-1");
        let created = session.last_active_at;

        let event = Event::new("node_completed", serde_json::json!({"node_id": "n1"}))
            .with_state_delta(serde_json::json!({"status": "running"}));
        session.apply(event);

        assert_eq!(session.state["status"], "running");
        assert_eq!(session.events.len(), 1);
        assert!(session.last_active_at >= created);
    }

    #[test]
    fn apply_without_delta_leaves_state_untouched() {
        let mut session = Session::new("s1".into(), "canvas-1", "user-1");
        session.state = serde_json::json!({"status": "running"});

        session.apply(Event::new("ping", serde_json::json!({})));

        assert_eq!(session.state["status"], "running");
    }

    #[test]
    fn apply_tombstone_deletes_key() {
        let mut session = Session::new("s1".into(), "canvas-1", "user-1");
        session.state = serde_json::json!({"a": 1, "b": 2});

        let event = Event::new("state_update", serde_json::json!({}))
            .with_state_delta(serde_json::json!({"a": {"__del__": true}, "c": 4}));
        session.apply(event);

        assert_eq!(session.state, serde_json::json!({"b": 2, "c": 4}));
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let session = Session::new("s1".into(), "canvas-1", "user-1");
        assert!(!session.is_expired());
    }
}
