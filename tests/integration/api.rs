//! End-to-end API tests against the in-memory store.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::json;

use student_records::api::{create_router, AppState};
use student_records::students::InMemoryStudentStore;

use crate::common::{call, timestamp};

fn app() -> Router {
    create_router(AppState::new(Arc::new(InMemoryStudentStore::new())), None)
}

#[tokio::test]
async fn student_lifecycle() {
    let app = app();

    let (status, created) = call(
        &app,
        "POST",
        "/api/v1/students",
        Some(json!({
            "matric_number": "CSC/2020/001",
            "first_name": "John",
            "last_name": "Doe",
            "email": "john@x.edu",
            "phone": "08012345678",
            "level": 300
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["matric_number"], "CSC/2020/001");
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, fetched) = call(&app, "GET", &format!("/api/v1/students/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["message"], "Student retrieved successfully");
    assert_eq!(fetched["data"], created["data"]);

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/v1/students/{id}"),
        Some(json!({
            "matric_number": "CSC/2020/001",
            "first_name": "John",
            "last_name": "Smith",
            "email": "john@x.edu",
            "level": 400
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["message"], "Student updated successfully");
    assert_eq!(updated["data"]["last_name"], "Smith");
    assert_eq!(updated["data"]["level"], 400);
    assert_eq!(updated["data"]["phone"], json!(null));
    assert!(timestamp(&updated["data"]["updated_at"]) > timestamp(&updated["data"]["created_at"]));

    let (status, deleted) = call(&app, "DELETE", &format!("/api/v1/students/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({ "message": "Student deleted successfully" }));

    let (status, missing) = call(&app, "GET", &format!("/api/v1/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing, json!({ "error": "Student not found" }));
}

#[tokio::test]
async fn list_is_newest_first_with_matching_count() {
    let app = app();

    for n in 1..=3 {
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/students",
            Some(json!({
                "matric_number": format!("CSC/2021/00{n}"),
                "first_name": "Student",
                "last_name": format!("Number{n}"),
                "email": format!("student{n}@x.edu"),
                "level": 100 * n
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, list) = call(&app, "GET", "/api/v1/students", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 3);

    let matrics: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["matric_number"].as_str().unwrap())
        .collect();
    assert_eq!(matrics, vec!["CSC/2021/003", "CSC/2021/002", "CSC/2021/001"]);
}

#[tokio::test]
async fn concurrent_duplicate_creates_leave_one_row() {
    let store = InMemoryStudentStore::new();
    let app = create_router(AppState::new(Arc::new(store.clone())), None);

    let body = json!({
        "matric_number": "CSC/2022/001",
        "first_name": "Ada",
        "last_name": "Obi",
        "email": "ada@x.edu",
        "level": 200
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let body = body.clone();
            tokio::spawn(async move { call(&app, "POST", "/api/v1/students", Some(body)).await })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => {
                assert_eq!(
                    body["error"],
                    "Student with this matric number or email already exists"
                );
                conflicts += 1;
            }
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn static_frontend_is_served_with_json_404_fallback() {
    let dir = std::env::temp_dir().join(format!("student-records-frontend-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>Students</h1>").unwrap();

    let app = create_router(
        AppState::new(Arc::new(InMemoryStudentStore::new())),
        Some(dir.as_path()),
    );

    let request = axum::http::Request::builder()
        .uri("/")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = call(&app, "GET", "/missing.js", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Route not found" }));

    let (status, _) = call(&app, "GET", "/api/v1/students", None).await;
    assert_eq!(status, StatusCode::OK);

    std::fs::remove_dir_all(&dir).ok();
}
