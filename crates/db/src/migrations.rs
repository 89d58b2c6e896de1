use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::connect_with_settings;

    const MANAGED_SCHEMA_OBJECTS: &[&str] =
        &["customer", "idx_customer_name", "idx_customer_email"];

    #[tokio::test]
    async fn migrations_create_customer_schema() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        for object in MANAGED_SCHEMA_OBJECTS {
            let count = sqlx::query("SELECT COUNT(*) AS count FROM sqlite_master WHERE name = ?")
                .bind(object)
                .fetch_one(&pool)
                .await
                .expect("inspect schema")
                .get::<i64, _>("count");
            assert_eq!(count, 1, "expected schema object `{object}`");
        }

        let columns: Vec<String> = sqlx::query("PRAGMA table_info(customer)")
            .fetch_all(&pool)
            .await
            .expect("table info")
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();
        assert!(!columns.iter().any(|column| column == "tier"), "tier must not be persisted");

        pool.close().await;
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run should be a no-op");
        pool.close().await;
    }
}
