//! Batch repository for database operations

use chrono::Utc;

use crate::db::connection::DatabasePool;
use crate::db::models::BatchRow;

pub struct BatchRepository;

impl BatchRepository {
    pub async fn create(
        pool: &DatabasePool,
        id: &str,
        canvas_id: &str,
        user_id: &str,
    ) -> Result<BatchRow, sqlx::Error> {
        sqlx::query_as::<_, BatchRow>(
            "INSERT INTO batches (id, canvas_id, user_id, finished_at)
             VALUES (?, ?, ?, NULL)
             RETURNING *",
        )
        .bind(id)
        .bind(canvas_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<BatchRow>, sqlx::Error> {
        sqlx::query_as::<_, BatchRow>("SELECT * FROM batches WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_finished(pool: &DatabasePool, id: &str) -> Result<u64, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE batches SET finished_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
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
            "CREATE TABLE batches (
                id TEXT PRIMARY KEY NOT NULL,
                canvas_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                finished_at TEXT
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn create_then_finish_round_trips() {
        let pool = setup_db().await;
        let batch = BatchRepository::create(&pool, "b1", "canvas-1", "user-1")
            .await
            .unwrap();
        assert!(batch.finished_at.is_none());

        let affected = BatchRepository::mark_finished(&pool, "b1").await.unwrap();
        assert_eq!(affected, 1);

        let fetched = BatchRepository::get_by_id(&pool, "b1")
            .await
            .unwrap()
            .unwrap();
        assert!(fetched.finished_at.is_some());
    }

    #[tokio::test]
    async fn finishing_unknown_batch_affects_nothing() {
        let pool = setup_db().await;
        let affected = BatchRepository::mark_finished(&pool, "ghost").await.unwrap();
        assert_eq!(affected, 0);
    }
}
