//! Record repository interface.

use async_trait::async_trait;

use crate::error::StoreError;

use super::model::{NewStudent, Student};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD over the `students` table.
///
/// Each method is a single statement. Uniqueness is enforced by the store
/// itself, so concurrent conflicting writes surface as
/// [`StoreError::Conflict`] on all but one of them.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Insert a row and return it with its generated id and timestamps.
    async fn create(&self, student: &NewStudent) -> StoreResult<Student>;

    /// All rows, newest first.
    async fn find_all(&self) -> StoreResult<Vec<Student>>;

    /// The row with this id, if any.
    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Student>>;

    /// Overwrite the six mutable fields of the row with this id.
    ///
    /// Returns [`StoreError::NotFound`] when no row matches.
    async fn update(&self, id: i32, student: &NewStudent) -> StoreResult<Student>;

    /// Remove the row with this id. Returns whether a row was removed.
    async fn delete(&self, id: i32) -> StoreResult<bool>;

    /// Check that the store answers.
    async fn ping(&self) -> StoreResult<()>;
}
