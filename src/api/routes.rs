//! HTTP API route definitions.

use std::path::Path;

use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::handlers::{
    api_info, api_v1_info, create_student, delete_student, get_student, handle_panic, health,
    list_students, metrics, openapi_json, ready, route_not_found, update_student, AppState,
};

/// Version prefix of the JSON API.
pub const API_PREFIX: &str = "/api/v1";

/// Routes mounted under [`API_PREFIX`].
fn v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/students",
            get(list_students)
                .post(create_student)
                .fallback(route_not_found),
        )
        .route(
            "/students/:id",
            get(get_student)
                .put(update_student)
                .delete(delete_student)
                .fallback(route_not_found),
        )
        .route("/healthcheck", get(health))
        .route("/ready", get(ready))
}

/// Create the API router.
///
/// When `frontend` names an existing directory, unmatched requests are tried
/// against it as static files before the JSON 404.
pub fn create_router(state: AppState, frontend: Option<&Path>) -> Router {
    let router = Router::new()
        .nest(API_PREFIX, v1_router())
        .route(API_PREFIX, get(api_v1_info))
        // Health endpoints
        .route("/healthcheck", get(health))
        .route("/api", get(api_info))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/metrics", get(metrics));

    let router = match frontend.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            debug!(dir = %dir.display(), "Serving static frontend");
            let static_files = ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(route_not_found.into_service());
            router.fallback_service(static_files)
        }
        None => router.fallback(route_not_found),
    };

    router
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Any origin, echoed back so credentials are allowed.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}
