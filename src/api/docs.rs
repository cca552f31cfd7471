//! OpenAPI description of the HTTP API.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::students::{Student, StudentPayload};

use super::handlers::{
    HealthResponse, MessageResponse, ReadyResponse, StudentListResponse, StudentResponse,
};

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "FUTA Students API", description = "Student records CRUD service"),
    paths(
        super::handlers::create_student,
        super::handlers::list_students,
        super::handlers::get_student,
        super::handlers::update_student,
        super::handlers::delete_student,
        super::handlers::health,
        super::handlers::ready,
    ),
    components(schemas(
        Student,
        StudentPayload,
        StudentResponse,
        StudentListResponse,
        MessageResponse,
        HealthResponse,
        ReadyResponse,
        ErrorResponse,
    )),
    tags(
        (name = "students", description = "Student records"),
        (name = "health", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;
