//! Student record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Department assigned by the store when none is given.
pub const DEFAULT_DEPARTMENT: &str = "Computer Science";

/// Fields a create or update request must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "matric_number",
    "first_name",
    "last_name",
    "email",
    "level",
];

/// A persisted student row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    /// Store-assigned identifier.
    pub id: i32,
    /// Matriculation number, unique.
    pub matric_number: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address, unique.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Study level (100, 200, ...).
    pub level: i32,
    /// Department; always the store default.
    pub department: String,
    /// Insert time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Request body for create and update.
///
/// Every field is optional at the wire level so that absent fields can be
/// reported together instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StudentPayload {
    /// Matriculation number.
    #[serde(default)]
    pub matric_number: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Study level.
    #[serde(default)]
    pub level: Option<i32>,
}

/// The six mutable attributes, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    /// Matriculation number.
    pub matric_number: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number; empty input is stored as null.
    pub phone: Option<String>,
    /// Study level.
    pub level: i32,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl StudentPayload {
    /// Names of required fields that are absent, null, blank, or zero.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            present(&self.matric_number).is_some(),
            present(&self.first_name).is_some(),
            present(&self.last_name).is_some(),
            present(&self.email).is_some(),
            self.level.is_some_and(|level| level != 0),
        ];

        REQUIRED_FIELDS
            .iter()
            .zip(checks)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Validate presence and convert into [`NewStudent`].
    ///
    /// On failure returns the missing field names.
    pub fn into_new_student(self) -> Result<NewStudent, Vec<&'static str>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }

        let owned = |value: &Option<String>| present(value).map(str::to_string).unwrap_or_default();
        Ok(NewStudent {
            matric_number: owned(&self.matric_number),
            first_name: owned(&self.first_name),
            last_name: owned(&self.last_name),
            email: owned(&self.email),
            phone: present(&self.phone).map(str::to_string),
            level: self.level.unwrap_or_default(),
        })
    }
}
