use chrono::Utc;
use sqlx::SqlitePool;

/// Raw string key/value rows in the `kv_store` table.
#[derive(Clone, Debug)]
pub struct KvRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ValueRow {
    value: String,
}

impl KvRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<ValueRow> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.value))
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn keys(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        repo: KvRepository,
        _temp_dir: TempDir,
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(&db_path).await.unwrap();
        TestContext {
            repo: KvRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let ctx = setup_repo().await;
        assert_eq!(ctx.repo.get("classes").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.put("classes", "[]").await.unwrap();
        assert_eq!(repo.get("classes").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.put("attendance-1", "{}").await.unwrap();
        repo.put("attendance-1", r#"{"2024-01-01":{}}"#).await.unwrap();

        assert_eq!(
            repo.get("attendance-1").await.unwrap().as_deref(),
            Some(r#"{"2024-01-01":{}}"#)
        );
        assert_eq!(repo.keys().await.unwrap(), vec!["attendance-1"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.put("class-1", "[]").await.unwrap();
        repo.delete("class-1").await.unwrap();
        assert_eq!(repo.get("class-1").await.unwrap(), None);

        // deleting a missing key is not an error
        repo.delete("class-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.put("classes", "[]").await.unwrap();
        repo.put("attendance-2", "{}").await.unwrap();
        repo.put("class-2", "[]").await.unwrap();

        assert_eq!(
            repo.keys().await.unwrap(),
            vec!["attendance-2", "class-2", "classes"]
        );
    }
}
