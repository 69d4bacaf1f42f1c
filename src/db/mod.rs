mod error;
mod memory;
mod models;
mod postgres;
mod store;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseConfig, StorageBackend};

pub use error::DatabaseError;
pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;
pub use store::{Store, StoreResult};

/// Initialize the database connection pool and apply pending migrations
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let url = config
        .url
        .as_deref()
        .context("DATABASE_URL must be set for the postgres storage backend")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Build the configured entity store.
pub async fn init_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>> {
    match config.backend {
        StorageBackend::Postgres => {
            let pool = init_pool(config).await?;
            info!("Using postgres storage backend");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage backend; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
