//! An in-memory [`SessionStore`] reference implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{Result, SessionError};
use crate::session::{Event, Session, SessionSummary};
use crate::traits::SessionStore;

/// Sessions keyed by id, guarded by a single lock. `append_event`'s
/// atomicity requirement is satisfied trivially here: the write guard is
/// held across the whole read-modify-write, so no other caller can
/// observe or race the merge.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        user_id: &str,
        canvas_id: &str,
        session_id: Option<String>,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let id = match session_id {
            Some(id) => {
                if sessions.contains_key(&id) {
                    return Err(SessionError::AlreadyExists(id));
                }
                id
            }
            None => uuid::Uuid::new_v4().to_string(),
        };

        let session = Session::new(id.clone(), canvas_id, user_id);
        sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|session| !session.deleted)
            .cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .filter(|session| !session.deleted && session.user_id == user_id)
            .map(Session::summary)
            .collect();
        summaries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(summaries)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.deleted = true;
                Ok(())
            }
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    async fn append_event(&self, session_id: &str, event: Event) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if !session.deleted => {
                session.apply(event);
                Ok(session.clone())
            }
            _ => Err(SessionError::NotFound(session_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        let session = store.create("user-1", "canvas-1", None).await.unwrap();

        let fetched = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.user_id, "user-1");
    }

    #[tokio::test]
    async fn create_with_taken_explicit_id_errors() {
        let store = InMemorySessionStore::new();
        store
            .create("user-1", "canvas-1", Some("s1".into()))
            .await
            .unwrap();

        let err = store
            .create("user-1", "canvas-1", Some("s1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn append_event_folds_state_and_is_visible_to_get() {
        let store = InMemorySessionStore::new();
        let session = store.create("user-1", "canvas-1", None).await.unwrap();

        let event = Event::new("node_completed", serde_json::json!({}))
            .with_state_delta(serde_json::json!({"status": "done"}));
        let updated = store.append_event(&session.id, event).await.unwrap();
        assert_eq!(updated.state["status"], "done");

        let fetched = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.state["status"], "done");
        assert_eq!(fetched.events.len(), 1);
    }

    #[tokio::test]
    async fn delete_tombstones_rather_than_removes() {
        let store = InMemorySessionStore::new();
        let session = store.create("user-1", "canvas-1", None).await.unwrap();

        store.delete(&session.id).await.unwrap();
        assert!(store.get(&session.id).await.unwrap().is_none());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn delete_unknown_session_errors() {
        let store = InMemorySessionStore::new();
        let err = store.delete("ghost").await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn append_event_on_deleted_session_errors() {
        let store = InMemorySessionStore::new();
        let session = store.create("user-1", "canvas-1", None).await.unwrap();
        store.delete(&session.id).await.unwrap();

        let err = store
            .append_event(&session.id, Event::new("ping", serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_excludes_deleted_and_other_users_newest_first() {
        let store = InMemorySessionStore::new();
        let s1 = store.create("user-1", "canvas-1", None).await.unwrap();
        let s2 = store.create("user-1", "canvas-2", None).await.unwrap();
        store.create("user-2", "canvas-3", None).await.unwrap();

        store
            .append_event(&s2.id, Event::new("ping", serde_json::json!({})))
            .await
            .unwrap();

        let summaries = store.list("user-1").await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, s2.id);
        assert_eq!(summaries[1].id, s1.id);
    }
}
