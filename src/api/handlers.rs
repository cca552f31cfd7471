//! HTTP API handlers.

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::error::{ApiError, ErrorResponse, StoreError};
use crate::metrics::record_operation;
use crate::students::{NewStudent, Student, StudentPayload, StudentStore};

use super::docs::ApiDoc;

const CONFLICT_MESSAGE: &str = "Student with this matric number or email already exists";

/// Service identity reported by health and info endpoints.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Crate version.
    pub version: String,
    /// Environment name.
    pub environment: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "FUTA Students API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record repository.
    pub store: Arc<dyn StudentStore>,
    /// Service identity.
    pub service: Arc<ServiceInfo>,
    /// Prometheus handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self {
            store,
            service: Arc::new(ServiceInfo::default()),
            metrics: None,
        }
    }

    /// Replace the service identity.
    pub fn with_service(mut self, service: ServiceInfo) -> Self {
        self.service = Arc::new(service);
        self
    }

    /// Attach a Prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Single student response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentResponse {
    /// Outcome message.
    pub message: String,
    /// The student.
    pub data: Student,
}

/// Student list response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentListResponse {
    /// Outcome message.
    pub message: String,
    /// Students, newest first.
    pub data: Vec<Student>,
    /// Number of students in `data`.
    pub count: usize,
}

/// Message-only response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Outcome message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "OK".
    pub status: String,
    /// Server time.
    pub timestamp: DateTime<Utc>,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// Readiness check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the store answered.
    pub ready: bool,
}

fn student_response(message: &str, data: Student) -> Json<StudentResponse> {
    Json(StudentResponse {
        message: message.to_string(),
        data,
    })
}

/// Parse a path id. Non-numeric ids can never match a row.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>().map_err(|_| ApiError::student_not_found())
}

/// Unwrap the JSON body and check required fields.
fn validated(
    operation: &'static str,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<NewStudent, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(operation, error = %rejection.body_text(), "Rejected request body");
        record_operation(operation, "invalid");
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    payload.into_new_student().map_err(|missing| {
        let missing = missing.join(", ");
        warn!(operation, missing = %missing, "Missing required fields");
        record_operation(operation, "invalid");
        ApiError::Validation(format!("Missing required fields: {missing}"))
    })
}

/// Map a failed write to the client-facing error.
fn write_error(err: &StoreError, fallback: &str) -> ApiError {
    match err {
        StoreError::Conflict { .. } => ApiError::Conflict(CONFLICT_MESSAGE.to_string()),
        StoreError::NotFound { .. } => ApiError::student_not_found(),
        StoreError::Internal(_) => ApiError::WriteFailed(fallback.to_string()),
    }
}

/// Create a student.
#[utoipa::path(
    post,
    path = "/api/v1/students",
    tag = "students",
    request_body = StudentPayload,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Missing fields, duplicate matric number or email", body = ErrorResponse)
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    let new_student = validated("create", payload)?;

    match state.store.create(&new_student).await {
        Ok(student) => {
            info!(id = student.id, matric_number = %student.matric_number, "Student created");
            record_operation("create", "ok");
            Ok((
                StatusCode::CREATED,
                student_response("Student created successfully", student),
            ))
        }
        Err(e) => {
            error!(
                matric_number = %new_student.matric_number,
                error = %e,
                "Error creating student"
            );
            record_operation("create", e.kind().as_ref());
            Err(write_error(&e, "Failed to create student"))
        }
    }
}

/// List all students, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "students",
    responses(
        (status = 200, description = "All students", body = StudentListResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<StudentListResponse>, ApiError> {
    match state.store.find_all().await {
        Ok(students) => {
            info!(count = students.len(), "Retrieved students");
            record_operation("list", "ok");
            Ok(Json(StudentListResponse {
                message: "Students retrieved successfully".to_string(),
                count: students.len(),
                data: students,
            }))
        }
        Err(e) => {
            error!(error = %e, "Error retrieving students");
            record_operation("list", e.kind().as_ref());
            Err(ApiError::Internal("Failed to retrieve students".to_string()))
        }
    }
}

/// Fetch one student.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "The student", body = StudentResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError> {
    let id = parse_id(&id)?;

    match state.store.find_by_id(id).await {
        Ok(Some(student)) => {
            info!(id, matric_number = %student.matric_number, "Retrieved student");
            record_operation("get", "ok");
            Ok(student_response("Student retrieved successfully", student))
        }
        Ok(None) => {
            record_operation("get", "not_found");
            Err(ApiError::student_not_found())
        }
        Err(e) => {
            error!(id, error = %e, "Error retrieving student");
            record_operation("get", e.kind().as_ref());
            Err(ApiError::Internal("Failed to retrieve student".to_string()))
        }
    }
}

/// Replace a student's mutable fields.
#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student id")),
    request_body = StudentPayload,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Missing fields, duplicate matric number or email", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<Json<StudentResponse>, ApiError> {
    let id = parse_id(&id)?;

    match state.store.find_by_id(id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            record_operation("update", "not_found");
            return Err(ApiError::student_not_found());
        }
        Err(e) => {
            error!(id, error = %e, "Error updating student");
            record_operation("update", e.kind().as_ref());
            return Err(ApiError::WriteFailed("Failed to update student".to_string()));
        }
    }

    let changes = validated("update", payload)?;

    match state.store.update(id, &changes).await {
        Ok(student) => {
            info!(id, matric_number = %student.matric_number, "Student updated");
            record_operation("update", "ok");
            Ok(student_response("Student updated successfully", student))
        }
        Err(e) => {
            error!(id, error = %e, "Error updating student");
            record_operation("update", e.kind().as_ref());
            Err(write_error(&e, "Failed to update student"))
        }
    }
}

/// Delete a student.
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;

    match state.store.delete(id).await {
        Ok(true) => {
            info!(id, "Student deleted");
            record_operation("delete", "ok");
            Ok(Json(MessageResponse {
                message: "Student deleted successfully".to_string(),
            }))
        }
        Ok(false) => {
            record_operation("delete", "not_found");
            Err(ApiError::student_not_found())
        }
        Err(e) => {
            error!(id, error = %e, "Error deleting student");
            record_operation("delete", e.kind().as_ref());
            Err(ApiError::Internal("Failed to delete student".to_string()))
        }
    }
}

/// Health check handler - always returns 200, the store is not consulted.
#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        service: state.service.name.clone(),
        version: state.service.version.clone(),
    })
}

/// Readiness check handler - returns 200 if the store answers, 503 otherwise.
#[utoipa::path(
    get,
    path = "/api/v1/ready",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable", body = ReadyResponse),
        (status = 503, description = "Store unreachable", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { ready: true })),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse { ready: false }),
            )
        }
    }
}

/// `GET /api`
pub async fn api_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": state.service.name,
        "version": state.service.version,
        "environment": state.service.environment,
        "endpoints": {
            "healthcheck": "/api/v1/healthcheck",
            "students": "/api/v1/students",
            "openapi": "/api-docs/openapi.json",
        }
    }))
}

/// `GET /api/v1`
pub async fn api_v1_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": format!("{} v1", state.service.name),
        "endpoints": {
            "healthcheck": "/api/v1/healthcheck",
            "students": "/api/v1/students",
        }
    }))
}

/// OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Prometheus exposition, or 404 when metrics are disabled.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ApiError::route_not_found().into_response(),
    }
}

/// Fallback for unmatched paths and verbs.
pub async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Convert a handler panic into a generic 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Unhandled error");
    ApiError::internal().into_response()
}
