//! Process-local student repository.
//!
//! Enforces the same rules as the PostgreSQL table (unique matric number and
//! email, default department, newest-first listing, `updated_at` moving past
//! `created_at`, column length limits) without a database. Used by tests and
//! by the `memory` store backend.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;

use super::model::{NewStudent, Student, DEFAULT_DEPARTMENT};
use super::store::{StoreResult, StudentStore};

/// Configuration for in-memory store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Fail every operation with an internal error.
    pub fail_all: bool,
}

/// `VARCHAR` widths of the `students` columns.
const COLUMN_LIMITS: [(&str, usize); 5] = [
    ("matric_number", 20),
    ("first_name", 50),
    ("last_name", 50),
    ("email", 100),
    ("phone", 15),
];

/// Reject values wider than their column, as PostgreSQL does.
fn check_lengths(student: &NewStudent) -> StoreResult<()> {
    let values = [
        Some(student.matric_number.as_str()),
        Some(student.first_name.as_str()),
        Some(student.last_name.as_str()),
        Some(student.email.as_str()),
        student.phone.as_deref(),
    ];
    for ((column, limit), value) in COLUMN_LIMITS.iter().zip(values) {
        if value.is_some_and(|v| v.chars().count() > *limit) {
            return Err(StoreError::Internal(anyhow::anyhow!(
                "value too long for {column} (character varying({limit}))"
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Student>,
    next_id: i32,
}

impl Table {
    fn conflict(&self, student: &NewStudent, except: Option<i32>) -> Option<&'static str> {
        self.rows
            .iter()
            .filter(|row| Some(row.id) != except)
            .find_map(|row| {
                if row.matric_number == student.matric_number {
                    Some("students_matric_number_key")
                } else if row.email == student.email {
                    Some("students_email_key")
                } else {
                    None
                }
            })
    }
}

/// In-memory student store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStudentStore {
    config: MemoryStoreConfig,
    table: Arc<Mutex<Table>>,
}

impl InMemoryStudentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            table: Arc::default(),
        }
    }

    /// Create a store whose every operation fails.
    pub fn failing() -> Self {
        Self::with_config(MemoryStoreConfig { fail_all: true })
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.rows.len()).unwrap_or_default()
    }

    /// Check if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Table>> {
        if self.config.fail_all {
            return Err(StoreError::Internal(anyhow::anyhow!(
                "in-memory store configured to fail"
            )));
        }
        self.table
            .lock()
            .map_err(|_| StoreError::Internal(anyhow::anyhow!("in-memory store lock poisoned")))
    }
}

/// A timestamp strictly after `after`, normally the current time.
fn tick_after(after: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > after {
        now
    } else {
        after + Duration::microseconds(1)
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn create(&self, student: &NewStudent) -> StoreResult<Student> {
        let mut table = self.lock()?;
        check_lengths(student)?;
        if let Some(constraint) = table.conflict(student, None) {
            return Err(StoreError::Conflict {
                constraint: Some(constraint.to_string()),
            });
        }

        table.next_id += 1;
        let now = Utc::now();
        let row = Student {
            id: table.next_id,
            matric_number: student.matric_number.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            email: student.email.clone(),
            phone: student.phone.clone(),
            level: student.level,
            department: DEFAULT_DEPARTMENT.to_string(),
            created_at: now,
            updated_at: now,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn find_all(&self) -> StoreResult<Vec<Student>> {
        let table = self.lock()?;
        let mut rows = table.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Student>> {
        let table = self.lock()?;
        Ok(table.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn update(&self, id: i32, student: &NewStudent) -> StoreResult<Student> {
        let mut table = self.lock()?;
        if !table.rows.iter().any(|row| row.id == id) {
            return Err(StoreError::NotFound { id });
        }
        check_lengths(student)?;
        if let Some(constraint) = table.conflict(student, Some(id)) {
            return Err(StoreError::Conflict {
                constraint: Some(constraint.to_string()),
            });
        }

        let row = table
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(StoreError::NotFound { id })?;
        row.matric_number = student.matric_number.clone();
        row.first_name = student.first_name.clone();
        row.last_name = student.last_name.clone();
        row.email = student.email.clone();
        row.phone = student.phone.clone();
        row.level = student.level;
        row.updated_at = tick_after(row.updated_at.max(row.created_at));
        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut table = self.lock()?;
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);
        Ok(table.rows.len() < before)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}
