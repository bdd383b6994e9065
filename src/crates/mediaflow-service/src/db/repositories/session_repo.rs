//! Session repository for database operations

use chrono::Utc;

use crate::db::connection::DatabasePool;
use crate::db::models::SessionRow;

pub struct SessionRepository;

impl SessionRepository {
    pub async fn insert_new(
        pool: &DatabasePool,
        id: &str,
        canvas_id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, SessionRow>(
            "INSERT INTO sessions (id, canvas_id, user_id, created_at, last_active_at, state, events, deleted)
             VALUES (?, ?, ?, ?, ?, '{}', '[]', 0)
             ON CONFLICT(id) DO NOTHING
             RETURNING *",
        )
        .bind(id)
        .bind(canvas_id)
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .fetch_optional(pool)
        .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<SessionRow>, sqlx::Error> {
        sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = ? AND deleted = 0")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &DatabasePool, id: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_by_user(
        pool: &DatabasePool,
        user_id: &str,
    ) -> Result<Vec<SessionRow>, sqlx::Error> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE user_id = ? AND deleted = 0 ORDER BY last_active_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_deleted(pool: &DatabasePool, id: &str) -> Result<u64, sqlx::Error> {
        let affected = sqlx::query("UPDATE sessions SET deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    /// Overwrite `state`/`events`/`last_active_at` for a session in place.
    /// Called with the row lock implied by the caller's transaction so the
    /// read-modify-write that folds an event in stays atomic.
    pub async fn save_state(
        pool: &DatabasePool,
        id: &str,
        state_json: &str,
        events_json: &str,
        last_active_at: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE sessions SET state = ?, events = ?, last_active_at = ? WHERE id = ?",
        )
        .bind(state_json)
        .bind(events_json)
        .bind(last_active_at)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> sqlx::sqlite::SqlitePool {
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
    async fn insert_new_then_get_round_trips() {
        let pool = setup_db().await;
        let row = SessionRepository::insert_new(&pool, "s1", "canvas-1", "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.id, "s1");

        let fetched = SessionRepository::get_by_id(&pool, "s1").await.unwrap().unwrap();
        assert_eq!(fetched.canvas_id, "canvas-1");
    }

    #[tokio::test]
    async fn insert_new_with_taken_id_returns_none() {
        let pool = setup_db().await;
        SessionRepository::insert_new(&pool, "s1", "canvas-1", "user-1")
            .await
            .unwrap();

        let result = SessionRepository::insert_new(&pool, "s1", "canvas-2", "user-2")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn mark_deleted_hides_from_get() {
        let pool = setup_db().await;
        SessionRepository::insert_new(&pool, "s1", "canvas-1", "user-1")
            .await
            .unwrap();

        SessionRepository::mark_deleted(&pool, "s1").await.unwrap();
        assert!(SessionRepository::get_by_id(&pool, "s1").await.unwrap().is_none());
        assert!(SessionRepository::exists(&pool, "s1").await.unwrap());
    }
}
