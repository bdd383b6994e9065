//! Node and template repository for database operations

use crate::db::connection::DatabasePool;
use crate::db::models::{NodeRow, TemplateRow};

pub struct NodeRepository;

impl NodeRepository {
    pub async fn find_by_id(pool: &DatabasePool, id: &str) -> Result<Option<NodeRow>, sqlx::Error> {
        sqlx::query_as::<_, NodeRow>(
            "SELECT n.id, n.node_type, n.name, n.config, n.result, n.is_dirty,
                    t.is_transient AS template_is_transient, t.is_terminal AS template_is_terminal
             FROM nodes n
             JOIN templates t ON t.node_type = n.node_type
             WHERE n.id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_result(
        pool: &DatabasePool,
        id: &str,
        result_json: &str,
    ) -> Result<u64, sqlx::Error> {
        let affected = sqlx::query("UPDATE nodes SET result = ? WHERE id = ?")
            .bind(result_json)
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    pub async fn upsert(
        pool: &DatabasePool,
        id: &str,
        node_type: &str,
        name: &str,
        config_json: &str,
        is_dirty: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO nodes (id, node_type, name, config, result, is_dirty)
             VALUES (?, ?, ?, ?, NULL, ?)
             ON CONFLICT(id) DO UPDATE SET
                node_type = excluded.node_type,
                name = excluded.name,
                config = excluded.config,
                is_dirty = excluded.is_dirty",
        )
        .bind(id)
        .bind(node_type)
        .bind(name)
        .bind(config_json)
        .bind(is_dirty)
        .execute(pool)
        .await?;

        Ok(())
    }
}

pub struct TemplateRepository;

impl TemplateRepository {
    pub async fn find_by_type(
        pool: &DatabasePool,
        node_type: &str,
    ) -> Result<Option<TemplateRow>, sqlx::Error> {
        sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates WHERE node_type = ?")
            .bind(node_type)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(
        pool: &DatabasePool,
        node_type: &str,
        is_transient: bool,
        is_terminal: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO templates (node_type, is_transient, is_terminal)
             VALUES (?, ?, ?)
             ON CONFLICT(node_type) DO UPDATE SET
                is_transient = excluded.is_transient,
                is_terminal = excluded.is_terminal",
        )
        .bind(node_type)
        .bind(is_transient)
        .bind(is_terminal)
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
            "CREATE TABLE templates (
                node_type TEXT PRIMARY KEY NOT NULL,
                is_transient INTEGER NOT NULL,
                is_terminal INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE nodes (
                id TEXT PRIMARY KEY NOT NULL,
                node_type TEXT NOT NULL,
                name TEXT NOT NULL,
                config TEXT NOT NULL,
                result TEXT,
                is_dirty INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn find_by_id_joins_template() {
        let pool = setup_db().await;
        TemplateRepository::upsert(&pool, "upscale", false, false)
            .await
            .unwrap();
        NodeRepository::upsert(&pool, "n1", "upscale", "Upscale", "{}", true)
            .await
            .unwrap();

        let node = NodeRepository::find_by_id(&pool, "n1").await.unwrap().unwrap();
        assert_eq!(node.node_type, "upscale");
        assert!(!node.template_is_transient);
    }

    #[tokio::test]
    async fn update_result_on_missing_node_affects_nothing() {
        let pool = setup_db().await;
        let affected = NodeRepository::update_result(&pool, "ghost", "{}").await.unwrap();
        assert_eq!(affected, 0);
    }
}
