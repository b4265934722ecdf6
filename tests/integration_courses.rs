mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use common::{create_test_course, create_test_user, send_request, test_app};
use oets::modules::courses::model::CourseStatus;
use oets::modules::users::model::UserRole;

async fn upload_summary(
    db: PgPool,
    token: &str,
    course_id: Uuid,
    filename: &str,
    content: &[u8],
) -> (StatusCode, serde_json::Value) {
    let boundary = "oets-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            boundary, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/courses/{}/summary", course_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = test_app(db).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_trainer_creates_draft_with_roster(db: PgPool) {
    let (_, _, token) = create_test_user(&db, UserRole::Formateur).await;

    let (status, body) = send_request(
        test_app(db.clone()),
        "POST",
        "/api/courses",
        Some(&token),
        Some(json!({
            "title": "Advanced Spanish",
            "description": "Conversation focused",
            "supplier_type": "internal",
            "objectives": "Fluency",
            "contents": "Dialogues",
            "duration": "12 weeks",
            "team_members": [
                { "full_name": "Ana Diaz", "qualification": "PhD", "email": "ana@example.com" },
                { "full_name": "Luis Perez", "qualification": "MA", "email": "luis@example.com" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "draft");
    assert_eq!(body["team_members"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_roster_email_yields_one_member(db: PgPool) {
    let (_, _, token) = create_test_user(&db, UserRole::Formateur).await;

    let (status, body) = send_request(
        test_app(db),
        "POST",
        "/api/courses",
        Some(&token),
        Some(json!({
            "title": "German Basics",
            "supplier_type": "external",
            "team_members": [
                { "full_name": "Old Name", "qualification": "BA", "email": "dup@example.com" },
                { "full_name": "New Name", "qualification": "MA", "email": "dup@example.com" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let members = body["team_members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    // Last occurrence wins the upsert.
    assert_eq!(members[0]["full_name"], "New Name");
    assert_eq!(members[0]["qualification"], "MA");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_learner_cannot_create_course(db: PgPool) {
    let (_, _, token) = create_test_user(&db, UserRole::Learner).await;

    let (status, _) = send_request(
        test_app(db),
        "POST",
        "/api/courses",
        Some(&token),
        Some(json!({ "title": "Sneaky", "supplier_type": "internal" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_replaces_roster(db: PgPool) {
    let (creator, _, token) = create_test_user(&db, UserRole::Formateur).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, _) = send_request(
        test_app(db.clone()),
        "PATCH",
        &format!("/api/courses/{}", course_id),
        Some(&token),
        Some(json!({
            "team_members": [
                { "full_name": "First", "qualification": "BA", "email": "first@example.com" },
                { "full_name": "Second", "qualification": "MA", "email": "second@example.com" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_request(
        test_app(db),
        "PATCH",
        &format!("/api/courses/{}", course_id),
        Some(&token),
        Some(json!({
            "team_members": [
                { "full_name": "Third", "qualification": "PhD", "email": "third@example.com" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let members = body["team_members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["email"], "third@example.com");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_creator_cannot_update(db: PgPool) {
    let (creator, _, _) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, other_token) = create_test_user(&db, UserRole::Formateur).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, _) = send_request(
        test_app(db),
        "PATCH",
        &format!("/api/courses/{}", course_id),
        Some(&other_token),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_can_update_any_course(db: PgPool) {
    let (creator, _, _) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, admin_token) = create_test_user(&db, UserRole::Admin).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, body) = send_request(
        test_app(db),
        "PATCH",
        &format!("/api/courses/{}", course_id),
        Some(&admin_token),
        Some(json!({ "title": "Renamed by admin" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed by admin");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_creator_deletes_own_draft(db: PgPool) {
    let (creator, _, token) = create_test_user(&db, UserRole::Formateur).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, _) = send_request(
        test_app(db.clone()),
        "DELETE",
        &format!("/api/courses/{}", course_id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_request(
        test_app(db),
        "GET",
        &format!("/api/courses/{}", course_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_rejected_outside_draft_even_for_admin(db: PgPool) {
    let (creator, _, _) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, admin_token) = create_test_user(&db, UserRole::Admin).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Submitted).await;

    let (status, _) = send_request(
        test_app(db),
        "DELETE",
        &format!("/api/courses/{}", course_id),
        Some(&admin_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_creator_cannot_delete_draft(db: PgPool) {
    let (creator, _, _) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, learner_token) = create_test_user(&db, UserRole::Learner).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, _) = send_request(
        test_app(db),
        "DELETE",
        &format!("/api/courses/{}", course_id),
        Some(&learner_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_listing_scoped_to_creator_for_non_staff(db: PgPool) {
    let (creator, _, creator_token) = create_test_user(&db, UserRole::Formateur).await;
    let (other, _, _) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, admin_token) = create_test_user(&db, UserRole::Admin).await;

    create_test_course(&db, creator, CourseStatus::Draft).await;
    create_test_course(&db, other, CourseStatus::Draft).await;

    let (status, body) = send_request(
        test_app(db.clone()),
        "GET",
        "/api/courses",
        Some(&creator_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let (status, body) =
        send_request(test_app(db), "GET", "/api/courses", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_summary_upload_sets_path(db: PgPool) {
    let (creator, _, token) = create_test_user(&db, UserRole::Formateur).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, body) =
        upload_summary(db, &token, course_id, "summary.pdf", b"fake pdf content").await;

    assert_eq!(status, StatusCode::OK);
    let path = body["summary_path"].as_str().unwrap();
    assert!(path.starts_with(&format!("courses/{}", course_id)));
    assert!(path.ends_with(".pdf"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_summary_upload_rejects_bad_extension(db: PgPool) {
    let (creator, _, token) = create_test_user(&db, UserRole::Formateur).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, _) = upload_summary(db, &token, course_id, "summary.exe", b"nope").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_summary_upload_forbidden_for_non_creator(db: PgPool) {
    let (creator, _, _) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, other_token) = create_test_user(&db, UserRole::Learner).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;

    let (status, _) = upload_summary(db, &other_token, course_id, "summary.pdf", b"data").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_detail_scoped_to_creator_for_non_staff(db: PgPool) {
    let (creator, _, creator_token) = create_test_user(&db, UserRole::Formateur).await;
    let (_, _, learner_token) = create_test_user(&db, UserRole::Learner).await;
    let (_, _, admin_token) = create_test_user(&db, UserRole::Admin).await;
    let course_id = create_test_course(&db, creator, CourseStatus::Draft).await;
    let uri = format!("/api/courses/{}", course_id);

    // A stranger's draft is indistinguishable from a missing course.
    let (status, _) =
        send_request(test_app(db.clone()), "GET", &uri, Some(&learner_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        send_request(test_app(db.clone()), "GET", &uri, Some(&creator_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created_by"], creator.to_string());

    let (status, _) = send_request(test_app(db), "GET", &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_filter(db: PgPool) {
    let (_, _, admin_token) = create_test_user(&db, UserRole::Admin).await;
    let (creator, _, _) = create_test_user(&db, UserRole::Formateur).await;

    create_test_course(&db, creator, CourseStatus::Draft).await;
    create_test_course(&db, creator, CourseStatus::Published).await;

    let (status, body) = send_request(
        test_app(db),
        "GET",
        "/api/courses?status=published",
        Some(&admin_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["status"], "published");
}
