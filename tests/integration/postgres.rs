//! Tests against a real PostgreSQL.
//!
//! Uses the `DB_*` variables (and `.env`) like the server, with the database
//! name taken from `TEST_DB_NAME` (default `futa_students_test`).

use std::sync::Arc;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use student_records::api::{create_router, AppState};
use student_records::config::Config;
use student_records::db::{run_migrations, Database};
use student_records::error::StoreErrorKind;
use student_records::students::{NewStudent, PgStudentStore, StudentStore, DEFAULT_DEPARTMENT};

use crate::common::{call, timestamp};

/// Connect to the test database and make sure the schema exists.
async fn test_database() -> Database {
    let mut config = Config::load().unwrap_or_default();
    config.db_name =
        std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "futa_students_test".to_string());

    let db = Database::connect(&config.database())
        .await
        .expect("PostgreSQL must be reachable for ignored tests");
    run_migrations(db.pool()).await.unwrap();
    db
}

/// Table definition used by earlier deployments: plain `TIMESTAMP` columns
/// and a nullable department.
const LEGACY_STUDENTS_TABLE: &str = r#"
CREATE TABLE students (
    id SERIAL PRIMARY KEY,
    matric_number VARCHAR(20) UNIQUE NOT NULL,
    first_name VARCHAR(50) NOT NULL,
    last_name VARCHAR(50) NOT NULL,
    email VARCHAR(100) UNIQUE NOT NULL,
    phone VARCHAR(15),
    level INTEGER NOT NULL,
    department VARCHAR(100) DEFAULT 'Computer Science',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Remove rows left behind by a previous run of the test using `prefix`.
async fn purge(db: &Database, prefix: &str) {
    sqlx::query("DELETE FROM students WHERE matric_number LIKE $1")
        .bind(format!("{prefix}%"))
        .execute(db.pool())
        .await
        .unwrap();
}

fn student(matric: &str, email: &str) -> NewStudent {
    NewStudent {
        matric_number: matric.to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: email.to_string(),
        phone: Some("08012345678".to_string()),
        level: 300,
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn repository_round_trip() {
    let db = test_database().await;
    purge(&db, "PGR/").await;
    let store = PgStudentStore::from_database(&db);

    let created = store
        .create(&student("PGR/001", "pgr001@x.edu"))
        .await
        .unwrap();
    assert_eq!(created.department, DEFAULT_DEPARTMENT);
    assert!(created.updated_at >= created.created_at);

    let err = store
        .create(&student("PGR/001", "pgr-other@x.edu"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Conflict);

    let second = store
        .create(&student("PGR/002", "pgr002@x.edu"))
        .await
        .unwrap();
    let all = store.find_all().await.unwrap();
    let ours: Vec<i32> = all
        .iter()
        .filter(|s| s.matric_number.starts_with("PGR/"))
        .map(|s| s.id)
        .collect();
    assert_eq!(ours, vec![second.id, created.id]);

    let mut changes = student("PGR/001", "pgr001@x.edu");
    changes.last_name = "Smith".to_string();
    let updated = store.update(created.id, &changes).await.unwrap();
    assert_eq!(updated.last_name, "Smith");
    assert!(updated.updated_at > updated.created_at);

    let err = store
        .update(second.id, &student("PGR/001", "pgr002@x.edu"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    assert!(store.delete(created.id).await.unwrap());
    assert!(!store.delete(created.id).await.unwrap());
    assert!(store.find_by_id(created.id).await.unwrap().is_none());

    let err = store.update(created.id, &changes).await.unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);

    store.ping().await.unwrap();
    purge(&db, "PGR/").await;
    db.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn api_lifecycle_against_postgres() {
    let db = test_database().await;
    purge(&db, "PGA/").await;
    let app = create_router(
        AppState::new(Arc::new(PgStudentStore::from_database(&db))),
        None,
    );

    let (status, created) = call(
        &app,
        "POST",
        "/api/v1/students",
        Some(json!({
            "matric_number": "PGA/2020/001",
            "first_name": "John",
            "last_name": "Doe",
            "email": "pga-john@x.edu",
            "level": 300
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/students",
        Some(json!({
            "matric_number": "PGA/2020/002",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "pga-john@x.edu",
            "level": 300
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/v1/students/{id}"),
        Some(json!({
            "matric_number": "PGA/2020/001",
            "first_name": "John",
            "last_name": "Smith",
            "email": "pga-john@x.edu",
            "level": 400
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["last_name"], "Smith");
    assert!(timestamp(&updated["data"]["updated_at"]) > timestamp(&updated["data"]["created_at"]));

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/students/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "GET", &format!("/api/v1/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found");

    let (status, _) = call(&app, "GET", "/api/v1/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    purge(&db, "PGA/").await;
    db.close().await;
    db.close().await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn migrations_upgrade_legacy_timestamp_table() {
    let db = test_database().await;
    sqlx::raw_sql("DROP SCHEMA IF EXISTS legacy_upgrade CASCADE; CREATE SCHEMA legacy_upgrade;")
        .execute(db.pool())
        .await
        .unwrap();

    let config = Config::load().unwrap_or_default();
    let options = PgConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .database(&std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "futa_students_test".into()))
        .username(&config.db_user)
        .password(&config.db_password)
        .options([("search_path", "legacy_upgrade")]);
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::raw_sql(LEGACY_STUDENTS_TABLE).execute(&pool).await.unwrap();
    sqlx::query(
        "INSERT INTO students (matric_number, first_name, last_name, email, level, department) \
         VALUES ('OLD/001', 'Ada', 'Obi', 'ada@x.edu', 200, NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();

    run_migrations(&pool).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let store = PgStudentStore::new(pool.clone());
    let existing = store.find_all().await.unwrap();
    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].department, DEFAULT_DEPARTMENT);

    let created = store.create(&student("NEW/001", "new001@x.edu")).await.unwrap();
    assert_eq!(created.department, DEFAULT_DEPARTMENT);
    let ids: Vec<i32> = store.find_all().await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![created.id, existing[0].id]);

    pool.close().await;
    sqlx::raw_sql("DROP SCHEMA legacy_upgrade CASCADE")
        .execute(db.pool())
        .await
        .unwrap();
    db.close().await;
}
