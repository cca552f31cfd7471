//! Initial schema: the `students` table and its `updated_at` trigger.

use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

/// Table definition. Safe to run repeatedly.
pub const CREATE_STUDENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id SERIAL PRIMARY KEY,
    matric_number VARCHAR(20) UNIQUE NOT NULL,
    first_name VARCHAR(50) NOT NULL,
    last_name VARCHAR(50) NOT NULL,
    email VARCHAR(100) UNIQUE NOT NULL,
    phone VARCHAR(15),
    level INTEGER NOT NULL,
    department VARCHAR(100) NOT NULL DEFAULT 'Computer Science',
    created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Bring a table created with plain `TIMESTAMP` columns and a nullable
/// department up to the current definition. No-op on an up-to-date table.
///
/// Existing `TIMESTAMP` values are read in the session time zone.
pub const UPGRADE_STUDENTS_COLUMNS: &str = r#"
UPDATE students SET department = 'Computer Science' WHERE department IS NULL;
UPDATE students SET created_at = CURRENT_TIMESTAMP WHERE created_at IS NULL;
UPDATE students SET updated_at = created_at WHERE updated_at IS NULL;

ALTER TABLE students
    ALTER COLUMN department SET DEFAULT 'Computer Science',
    ALTER COLUMN department SET NOT NULL,
    ALTER COLUMN created_at TYPE TIMESTAMPTZ,
    ALTER COLUMN created_at SET DEFAULT CURRENT_TIMESTAMP,
    ALTER COLUMN created_at SET NOT NULL,
    ALTER COLUMN updated_at TYPE TIMESTAMPTZ,
    ALTER COLUMN updated_at SET DEFAULT CURRENT_TIMESTAMP,
    ALTER COLUMN updated_at SET NOT NULL;
"#;

/// Trigger refreshing `updated_at` on every row update.
///
/// `clock_timestamp()` rather than `CURRENT_TIMESTAMP` so an update in the
/// same transaction as the insert still moves the timestamp forward.
pub const CREATE_UPDATE_TRIGGER: &str = r#"
CREATE OR REPLACE FUNCTION update_updated_at_column()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = clock_timestamp();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS update_students_updated_at ON students;
CREATE TRIGGER update_students_updated_at
    BEFORE UPDATE ON students
    FOR EACH ROW
    EXECUTE FUNCTION update_updated_at_column();
"#;

/// Create the table and trigger if they do not exist, upgrading older
/// column types in place.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(CREATE_STUDENTS_TABLE).execute(pool).await?;
    info!("Students table created successfully");

    sqlx::raw_sql(UPGRADE_STUDENTS_COLUMNS).execute(pool).await?;
    info!("Students columns up to date");

    sqlx::raw_sql(CREATE_UPDATE_TRIGGER).execute(pool).await?;
    info!("Update trigger created successfully");

    Ok(())
}
