//! Pooled PostgreSQL connections.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Owner of the process-wide connection pool.
///
/// Created once at startup and closed on shutdown. Cloning shares the same
/// pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    name: String,
}

impl Database {
    /// Open the pool and establish the first connection.
    ///
    /// Fails if the database cannot be reached within the connect timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        // Credentials stay out of the logs.
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!(
                    host = %config.host,
                    port = config.port,
                    database = %config.database,
                    error = %e,
                    "Error connecting to PostgreSQL database"
                );
                e
            })?;

        info!(
            host = %config.host,
            max_connections = config.max_connections,
            "Connected to PostgreSQL database: {}",
            config.database
        );

        Ok(Self {
            pool,
            name: config.database.clone(),
        })
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `SELECT 1` on a pooled connection.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Wait for checked-out connections to return, then close them all.
    ///
    /// Calling this on a closed pool does nothing.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close().await;
        info!(database = %self.name, "Database connection pool closed");
    }
}
