//! PostgreSQL-backed student repository.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::StoreError;
use crate::metrics::timer_store;

use super::model::{NewStudent, Student};
use super::store::{StoreResult, StudentStore};

const INSERT_STUDENT: &str = r#"
INSERT INTO students (matric_number, first_name, last_name, email, phone, level)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING *
"#;

const SELECT_ALL_STUDENTS: &str = "SELECT * FROM students ORDER BY created_at DESC, id DESC";

const SELECT_STUDENT_BY_ID: &str = "SELECT * FROM students WHERE id = $1";

const UPDATE_STUDENT: &str = r#"
UPDATE students
SET matric_number = $1, first_name = $2, last_name = $3, email = $4, phone = $5, level = $6
WHERE id = $7
RETURNING *
"#;

const DELETE_STUDENT: &str = "DELETE FROM students WHERE id = $1";

/// Student repository over a shared [`PgPool`].
///
/// Every call checks out one pooled connection for one statement; sqlx
/// returns it to the pool whether the statement succeeds or fails.
#[derive(Debug, Clone)]
pub struct PgStudentStore {
    pool: PgPool,
}

impl PgStudentStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a store sharing the pool owned by `db`.
    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    #[instrument(skip(self, student), fields(matric_number = %student.matric_number))]
    async fn create(&self, student: &NewStudent) -> StoreResult<Student> {
        let _timer = timer_store("create");
        let row = sqlx::query_as::<_, Student>(INSERT_STUDENT)
            .bind(&student.matric_number)
            .bind(&student.first_name)
            .bind(&student.last_name)
            .bind(&student.email)
            .bind(&student.phone)
            .bind(student.level)
            .fetch_one(&self.pool)
            .await?;

        debug!(id = row.id, "Inserted student row");
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> StoreResult<Vec<Student>> {
        let _timer = timer_store("find_all");
        let rows = sqlx::query_as::<_, Student>(SELECT_ALL_STUDENTS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Student>> {
        let _timer = timer_store("find_by_id");
        let row = sqlx::query_as::<_, Student>(SELECT_STUDENT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    #[instrument(skip(self, student))]
    async fn update(&self, id: i32, student: &NewStudent) -> StoreResult<Student> {
        let _timer = timer_store("update");
        sqlx::query_as::<_, Student>(UPDATE_STUDENT)
            .bind(&student.matric_number)
            .bind(&student.first_name)
            .bind(&student.last_name)
            .bind(&student.email)
            .bind(&student.phone)
            .bind(student.level)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound { id })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let _timer = timer_store("delete");
        let result = sqlx::query(DELETE_STUDENT)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        let _timer = timer_store("ping");
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
