//! PostgreSQL connection management and schema bootstrap.

pub mod pool;
pub mod schema;

pub use pool::Database;
pub use schema::run_migrations;
