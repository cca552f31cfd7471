//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::AppError;

/// Which record store the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL through a connection pool.
    #[default]
    Postgres,
    /// Process-local store, nothing persists across restarts.
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Database ===
    /// Database host.
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// Database port.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Database name.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Database user.
    #[serde(default = "default_db_user")]
    pub db_user: String,

    /// Database password.
    #[serde(default = "default_db_password")]
    pub db_password: String,

    /// Maximum pooled connections.
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Idle connections are closed after this many milliseconds.
    #[serde(default = "default_db_idle_timeout_ms")]
    pub db_idle_timeout_ms: u64,

    /// Bound on connecting and on waiting for a pooled connection.
    #[serde(default = "default_db_connect_timeout_ms")]
    pub db_connect_timeout_ms: u64,

    /// Create the schema at startup.
    #[serde(default)]
    pub db_auto_migrate: bool,

    /// Record store backend.
    #[serde(default)]
    pub store_backend: StoreBackend,

    // === Server ===
    /// HTTP listening port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment name (development, production, test, ...).
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// Service name reported by the health check.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Static frontend directory. Empty disables static serving.
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,

    // === Observability ===
    /// Log filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and expose `/metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Connection settings handed to the pool.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
    /// Connect and acquire timeout.
    pub connect_timeout: Duration,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "futa_students".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "password".to_string()
}

fn default_db_max_connections() -> u32 {
    20
}

fn default_db_idle_timeout_ms() -> u64 {
    30_000
}

fn default_db_connect_timeout_ms() -> u64 {
    2_000
}

fn default_port() -> u16 {
    3000
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_service_name() -> String {
    "FUTA Students API".to_string()
}

fn default_frontend_dir() -> String {
    "frontend".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_name: default_db_name(),
            db_user: default_db_user(),
            db_password: default_db_password(),
            db_max_connections: default_db_max_connections(),
            db_idle_timeout_ms: default_db_idle_timeout_ms(),
            db_connect_timeout_ms: default_db_connect_timeout_ms(),
            db_auto_migrate: false,
            store_backend: StoreBackend::default(),
            port: default_port(),
            app_env: default_app_env(),
            service_name: default_service_name(),
            frontend_dir: default_frontend_dir(),
            rust_log: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(NAME, value)` pairs, applying defaults.
    pub fn from_vars<I>(vars: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars).map_err(AppError::from)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_backend == StoreBackend::Postgres {
            if self.db_host.is_empty() {
                return Err("DB_HOST is required".to_string());
            }
            if self.db_name.is_empty() {
                return Err("DB_NAME is required".to_string());
            }
            if self.db_user.is_empty() {
                return Err("DB_USER is required".to_string());
            }
        }

        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        if self.db_connect_timeout_ms == 0 {
            return Err("DB_CONNECT_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.service_name.is_empty() {
            return Err("SERVICE_NAME must not be empty".to_string());
        }

        Ok(())
    }

    /// Pool settings derived from the `DB_*` variables.
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            database: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            max_connections: self.db_max_connections,
            idle_timeout: Duration::from_millis(self.db_idle_timeout_ms),
            connect_timeout: Duration::from_millis(self.db_connect_timeout_ms),
        }
    }

    /// Frontend directory, if static serving is enabled.
    pub fn frontend_path(&self) -> Option<PathBuf> {
        if self.frontend_dir.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.frontend_dir))
        }
    }
}
