use std::sync::Arc;

use axum::Router;
use membership_core::config::{AppConfig, ConfigError};
use membership_core::tier::SystemClock;
use membership_db::{connect_with_settings, migrations, DbPool, SqlCustomerRepository};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{customers, health, store::CustomerStore};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub store: CustomerStore,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

impl Application {
    /// Customer and health routes behind request tracing.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(customers::router(self.store.clone()))
            .merge(health::router(self.db_pool.clone()))
            .layer(TraceLayer::new_for_http())
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let store = CustomerStore::new(
        Arc::new(SqlCustomerRepository::new(db_pool.clone())),
        Arc::new(SystemClock),
    );

    Ok(Application { config, db_pool, store })
}
