//! Student records REST service.
//!
//! CRUD over a single PostgreSQL `students` table, exposed as a JSON API
//! under `/api/v1`, plus a health check and a static frontend.
//!
//! ```text
//! frontend ─► api::routes ─► api::handlers ─► students::StudentStore ─► db::Database ─► PostgreSQL
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`db`]: Connection pool and schema bootstrap
//! - [`students`]: Student model and repositories
//! - [`api`]: HTTP handlers and routes
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod students;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
