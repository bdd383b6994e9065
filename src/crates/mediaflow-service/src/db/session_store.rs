//! The `sqlx`-backed [`SessionStore`] implementation.
//!
//! `append_event`'s atomicity requirement is met with a single `sqlx`
//! transaction: SQLite takes an exclusive write lock for the whole
//! transaction on the first write statement, so the read-modify-write here
//! is indivisible with respect to other callers the same way the teacher's
//! repository methods rely on a single `execute`/`fetch_one` round trip
//! being atomic at the database level.

use async_trait::async_trait;
use chrono::Utc;

use mediaflow_sessions::error::{Result, SessionError};
use mediaflow_sessions::session::{Event, Session, SessionSummary};
use mediaflow_sessions::traits::SessionStore;

use crate::db::connection::DatabasePool;
use crate::db::models::SessionRow;
use crate::db::repositories::SessionRepository;

fn classify(err: sqlx::Error) -> SessionError {
    SessionError::Storage(err.to_string())
}

pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(
        &self,
        user_id: &str,
        canvas_id: &str,
        session_id: Option<String>,
    ) -> Result<Session> {
        let id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let row = SessionRepository::insert_new(&self.pool, &id, canvas_id, user_id)
            .await
            .map_err(classify)?;

        match row {
            Some(row) => row.into_session().map_err(SessionError::from),
            None => Err(SessionError::AlreadyExists(id)),
        }
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        match SessionRepository::get_by_id(&self.pool, session_id)
            .await
            .map_err(classify)?
        {
            Some(row) => Ok(Some(row.into_session()?)),
            None => Ok(None),
        }
    }

    async fn list(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let rows = SessionRepository::list_by_user(&self.pool, user_id)
            .await
            .map_err(classify)?;

        rows.into_iter()
            .map(|row| row.into_session().map(|session| session.summary()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(SessionError::from)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let affected = SessionRepository::mark_deleted(&self.pool, session_id)
            .await
            .map_err(classify)?;
        if affected == 0 {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        Ok(())
    }

    async fn append_event(&self, session_id: &str, event: Event) -> Result<Session> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        let row: Option<SessionRow> =
            sqlx::query_as("SELECT * FROM sessions WHERE id = ? AND deleted = 0")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(classify)?;

        let mut session = match row {
            Some(row) => row.into_session()?,
            None => return Err(SessionError::NotFound(session_id.to_string())),
        };

        session.apply(event);

        sqlx::query("UPDATE sessions SET state = ?, events = ?, last_active_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&session.state)?)
            .bind(serde_json::to_string(&session.events)?)
            .bind(session.last_active_at.to_rfc3339())
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;

        Ok(session)
    }
}

/// Stamp `last_active_at` on every non-deleted row older than `cutoff`'s
/// complement as expired is left to callers; this helper exists only to
/// make the TTL check queryable without loading every session's full
/// event log, mirroring `SessionRepository::list_stale`'s teacher analogue.
pub async fn expired_session_ids(
    pool: &DatabasePool,
    ttl_days: i64,
) -> std::result::Result<Vec<String>, sqlx::Error> {
    let cutoff = (Utc::now() - chrono::Duration::days(ttl_days)).to_rfc3339();
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT id FROM sessions WHERE deleted = 0 AND last_active_at < ?",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> DatabasePool {
        let pool = sqlx::sqlite::SqlitePool::connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE sessions (
                id TEXT PRIMARY KEY NOT NULL,
                canvas_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_active_at TEXT NOT NULL,
                state TEXT NOT NULL,
                events TEXT NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn create_then_append_event_folds_state() {
        let pool = setup_db().await;
        let store = SqliteSessionStore::new(pool);

        let session = store.create("user-1", "canvas-1", None).await.unwrap();
        let event = Event::new("node_completed", serde_json::json!({}))
            .with_state_delta(serde_json::json!({"status": "done"}));
        let updated = store.append_event(&session.id, event).await.unwrap();

        assert_eq!(updated.state["status"], "done");
        let fetched = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.state["status"], "done");
    }

    #[tokio::test]
    async fn delete_then_get_returns_none() {
        let pool = setup_db().await;
        let store = SqliteSessionStore::new(pool);

        let session = store.create("user-1", "canvas-1", None).await.unwrap();
        store.delete(&session.id).await.unwrap();

        assert!(store.get(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_with_taken_explicit_id_errors() {
        let pool = setup_db().await;
        let store = SqliteSessionStore::new(pool);

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
}
