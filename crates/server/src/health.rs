//! `GET /health`: ready when the customer table answers a query.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use membership_db::DbPool;
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: Readiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(db_pool)
}

pub async fn health(State(db_pool): State<DbPool>) -> (StatusCode, Json<Health>) {
    let checked_at = Utc::now().to_rfc3339();
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customer")
        .fetch_one(&db_pool)
        .await;

    match count {
        Ok(count) => {
            let health = Health {
                status: Readiness::Ready,
                customer_count: Some(count),
                reason: None,
                checked_at,
            };
            (StatusCode::OK, Json(health))
        }
        Err(error) => {
            warn!(event_name = "system.health.degraded", error = %error, "health check failed");
            let health = Health {
                status: Readiness::Degraded,
                customer_count: None,
                reason: Some(error.to_string()),
                checked_at,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(health))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use membership_db::{connect_with_settings, migrations, DbPool};
    use serde_json::json;

    use super::{health, Readiness};

    async fn pool(migrated: bool) -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        if migrated {
            migrations::run_pending(&pool).await.expect("migrations");
        }
        pool
    }

    #[tokio::test]
    async fn migrated_database_is_ready() {
        let pool = pool(true).await;

        let (status, Json(report)) = health(State(pool.clone())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, Readiness::Ready);
        assert_eq!(report.customer_count, Some(0));
        let body = serde_json::to_value(&report).expect("serialize");
        assert_eq!(body["status"], json!("ready"));
        assert_eq!(body["customerCount"], json!(0));
        assert!(body.get("reason").is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_schema_is_degraded() {
        let pool = pool(false).await;

        let (status, Json(report)) = health(State(pool.clone())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, Readiness::Degraded);
        assert!(report.reason.is_some_and(|reason| reason.contains("customer")));

        pool.close().await;
    }

    #[tokio::test]
    async fn closed_pool_is_degraded() {
        let pool = pool(true).await;
        pool.close().await;

        let (status, Json(report)) = health(State(pool)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.customer_count, None);
    }
}
