//! Student records: model, repository trait, and its implementations.
//!
//! - [`model`]: row and request types
//! - [`store`]: the [`StudentStore`] repository trait
//! - [`postgres`]: PostgreSQL implementation
//! - [`memory`]: process-local implementation for tests and demos

pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use memory::InMemoryStudentStore;
pub use model::{NewStudent, Student, StudentPayload, DEFAULT_DEPARTMENT};
pub use postgres::PgStudentStore;
pub use store::{StoreResult, StudentStore};
