mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{create_test_user, deactivate_user, send_request, test_app};
use oets::modules::users::model::UserRole;

#[sqlx::test(migrations = "./migrations")]
async fn test_login_returns_token_and_user(db: PgPool) {
    let (_, email, _) = create_test_user(&db, UserRole::Formateur).await;

    let (status, body) = send_request(
        test_app(db),
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "formateur");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_rejects_wrong_password(db: PgPool) {
    let (_, email, _) = create_test_user(&db, UserRole::Learner).await;

    let (status, _) = send_request(
        test_app(db),
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_rejects_unknown_email(db: PgPool) {
    let (status, _) = send_request(
        test_app(db),
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@oets.test", "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_rejects_inactive_user(db: PgPool) {
    let (id, email, _) = create_test_user(&db, UserRole::Learner).await;
    deactivate_user(&db, id).await;

    let (status, _) = send_request(
        test_app(db),
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_returns_profile(db: PgPool) {
    let (id, email, token) = create_test_user(&db, UserRole::Responsable).await;

    let (status, body) =
        send_request(test_app(db), "GET", "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());
    assert_eq!(body["email"], email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_requires_token(db: PgPool) {
    let (status, _) = send_request(test_app(db), "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_garbage_token_is_rejected(db: PgPool) {
    let (status, _) = send_request(
        test_app(db),
        "GET",
        "/api/auth/me",
        Some("not-a-real-token"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
