//! HTTP API module: student CRUD, health, readiness, metrics, and docs.

pub mod docs;
pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ServiceInfo};
pub use routes::{create_router, API_PREFIX};
