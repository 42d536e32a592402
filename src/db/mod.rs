//! PostgreSQL backend
//!
//! - [`Database`]: connection pool lifecycle, schema bootstrap, health check
//! - [`queries`]: one async fn per SQL statement, executed on any `PgConnection`
//! - [`PgStore`]: the [`crate::store::Store`] implementation over the pool

pub mod postgres;
pub mod queries;
pub mod schema;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;

pub use postgres::{PgSession, PgStore, PgUnitOfWork};

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// Every pooled connection runs with `lock_timeout` set, so a transfer blocked on
    /// a row lock fails instead of waiting forever.
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let lock_timeout_ms = config.lock_timeout_ms;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    let stmt = format!("SET lock_timeout = '{}ms'", lock_timeout_ms);
                    sqlx::query(&stmt).execute(conn).await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            lock_timeout_ms,
            "PostgreSQL connection pool established"
        );
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        schema::init_schema(&self.pool).await
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection; waits for checked-out ones to come back.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}
