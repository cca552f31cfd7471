//! Unified error types for the student records service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;
use utoipa::ToSchema;

/// Startup and infrastructure errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Discriminant of a [`StoreError`], used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StoreErrorKind {
    /// A unique column already holds the value.
    Conflict,
    /// No row matched the identifier.
    NotFound,
    /// Anything else the store reported.
    Internal,
}

/// Record store errors, classified where the statement runs.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint violated (matric number or email).
    #[error("unique constraint violated: {}", constraint.as_deref().unwrap_or("unknown"))]
    Conflict {
        /// Name of the violated constraint, when the store reports it.
        constraint: Option<String>,
    },

    /// No row matched the identifier.
    #[error("student {id} not found")]
    NotFound {
        /// The identifier that matched nothing.
        id: i32,
    },

    /// Connection, timeout or any other unexpected failure.
    #[error("store failure: {0}")]
    Internal(#[source] anyhow::Error),
}

impl StoreError {
    /// Get the error discriminant.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Conflict { .. } => StoreErrorKind::Conflict,
            StoreError::NotFound { .. } => StoreErrorKind::NotFound,
            StoreError::Internal(_) => StoreErrorKind::Internal,
        }
    }

    /// Check if this is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        self.kind() == StoreErrorKind::Conflict
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict {
                    constraint: db_err.constraint().map(str::to_string),
                };
            }
        }
        StoreError::Internal(err.into())
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable error message.
    pub error: String,
}

/// Errors returned by HTTP handlers.
///
/// Each variant carries the message sent to the client; store details never
/// reach this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Unique value already taken.
    #[error("{0}")]
    Conflict(String),

    /// Write failed for a reason other than a conflict.
    #[error("{0}")]
    WriteFailed(String),

    /// No matching record or route.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::WriteFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The 404 for an unknown student.
    pub fn student_not_found() -> Self {
        ApiError::NotFound("Student not found".to_string())
    }

    /// The 404 for an unmatched route.
    pub fn route_not_found() -> Self {
        ApiError::NotFound("Route not found".to_string())
    }

    /// The generic 500 used by the panic boundary.
    pub fn internal() -> Self {
        ApiError::Internal("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
