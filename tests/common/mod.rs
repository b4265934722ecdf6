#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use oets::config::cors::CorsConfig;
use oets::config::email::EmailConfig;
use oets::config::jwt::JwtConfig;
use oets::modules::courses::model::CourseStatus;
use oets::modules::users::model::UserRole;
use oets::router::init_router;
use oets::state::AppState;
use oets::utils::email::EmailService;
use oets::utils::files::LocalFileStorage;
use oets::utils::jwt::create_access_token;
use oets::utils::password::hash_password;

static EMAIL_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_email(prefix: &str) -> String {
    let n = EMAIL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}@oets.test", prefix, Uuid::new_v4().simple(), n)
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn test_state(db: PgPool) -> AppState {
    // SMTP stays disabled so sends short-circuit to success.
    let email_config = EmailConfig {
        enabled: false,
        smtp_host: "localhost".to_string(),
        smtp_port: 1025,
        smtp_username: String::new(),
        smtp_password: String::new(),
        from_email: "noreply@oets.test".to_string(),
        from_name: "OETS".to_string(),
    };

    AppState {
        db,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        email_service: Arc::new(EmailService::new(email_config)),
        storage: Arc::new(LocalFileStorage::new(
            std::env::temp_dir().join("oets-test-uploads"),
        )),
    }
}

pub fn test_app(db: PgPool) -> Router {
    init_router(test_state(db))
}

/// Insert a user directly and mint a bearer token for them.
pub async fn create_test_user(db: &PgPool, role: UserRole) -> (Uuid, String, String) {
    let email = unique_email(&role.to_string());
    let password = hash_password("password123").expect("hash password");

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (first_name, last_name, email, password, role)
         VALUES ($1, $2, $3, $4, $5::user_role)
         RETURNING id",
    )
    .bind("Test")
    .bind("User")
    .bind(&email)
    .bind(&password)
    .bind(role.to_string())
    .fetch_one(db)
    .await
    .expect("insert test user");

    let token =
        create_access_token(id, &email, role, None, &test_jwt_config()).expect("create token");

    (id, email, token)
}

pub async fn deactivate_user(db: &PgPool, user_id: Uuid) {
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user_id)
        .execute(db)
        .await
        .expect("deactivate user");
}

pub async fn link_parent_child(db: &PgPool, parent_id: Uuid, child_id: Uuid) {
    sqlx::query(
        "INSERT INTO parent_child_relationships (parent_id, child_id) VALUES ($1, $2)",
    )
    .bind(parent_id)
    .bind(child_id)
    .execute(db)
    .await
    .expect("link parent and child");
}

/// Insert a complete course in the given status.
pub async fn create_test_course(db: &PgPool, created_by: Uuid, status: CourseStatus) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO courses (title, description, objectives, contents, duration, status, created_by)
         VALUES ($1, $2, $3, $4, $5, $6::course_status, $7)
         RETURNING id",
    )
    .bind("Intro to French")
    .bind("A beginner French course")
    .bind("Read and write basic French")
    .bind("Grammar, vocabulary, conversation")
    .bind("8 weeks")
    .bind(status.to_string())
    .bind(created_by)
    .fetch_one(db)
    .await
    .expect("insert test course")
}

pub async fn course_status(db: &PgPool, course_id: Uuid) -> String {
    sqlx::query_scalar::<_, String>("SELECT status::text FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(db)
        .await
        .expect("fetch course status")
}

pub async fn notification_count(db: &PgPool, recipient_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1",
    )
    .bind(recipient_id)
    .fetch_one(db)
    .await
    .expect("count notifications")
}

/// Fire one request at the app and decode the JSON response.
pub async fn send_request(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.oneshot(request).await.expect("send request");
    let status = response.status();

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
