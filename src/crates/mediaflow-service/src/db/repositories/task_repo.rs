//! Task repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::TaskRow;

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create(
        pool: &DatabasePool,
        id: &str,
        batch_id: &str,
        node_id: &str,
    ) -> Result<TaskRow, sqlx::Error> {
        sqlx::query_as::<_, TaskRow>(
            "INSERT INTO tasks (id, node_id, batch_id, status, started_at, finished_at, duration_ms, error, result)
             VALUES (?, ?, ?, 'queued', NULL, NULL, NULL, NULL, NULL)
             RETURNING *",
        )
        .bind(id)
        .bind(node_id)
        .bind(batch_id)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<TaskRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_batch(
        pool: &DatabasePool,
        batch_id: &str,
    ) -> Result<Vec<TaskRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE batch_id = ?")
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &DatabasePool,
        id: &str,
        status: &str,
        started_at: Option<&str>,
        finished_at: Option<&str>,
        duration_ms: Option<i64>,
        error: Option<&str>,
        result: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET status = ?, started_at = ?, finished_at = ?, duration_ms = ?, error = ?, result = ?
             WHERE id = ?",
        )
        .bind(status)
        .bind(started_at)
        .bind(finished_at)
        .bind(duration_ms)
        .bind(error)
        .bind(result)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }
}
