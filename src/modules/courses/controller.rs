use axum::{
    Json,
    extract::{Multipart, Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CourseDetails, CourseFilterParams, CreateCourseDto, PaginatedCoursesResponse,
    TransitionResponse, UpdateCourseDto,
};
use super::service::CourseService;

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 200, description = "Course created as a draft", body = CourseDetails),
        (status = 403, description = "Role may not create courses"),
        (status = 422, description = "Validation error")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn create_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<Json<CourseDetails>, AppError> {
    let course =
        CourseService::create_course(&state.db, auth_user.user_id()?, auth_user.role(), dto)
            .await?;
    Ok(Json(course))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(
        ("status" = Option<String>, Query, description = "Filter by lifecycle status"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination")
    ),
    responses(
        (status = 200, description = "Paginated list of courses", body = PaginatedCoursesResponse)
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn get_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<CourseFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let courses =
        CourseService::get_courses(&state.db, auth_user.user_id()?, auth_user.role(), filters)
            .await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with its team roster", body = CourseDetails),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn get_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseDetails>, AppError> {
    let course =
        CourseService::get_course(&state.db, auth_user.user_id()?, auth_user.role(), id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    patch,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = CourseDetails),
        (status = 403, description = "Not the creator or staff"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn update_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<CourseDetails>, AppError> {
    let course =
        CourseService::update_course(&state.db, auth_user.user_id()?, auth_user.role(), id, dto)
            .await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 400, description = "Course is no longer a draft"),
        (status = 403, description = "Not the creator or staff"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn delete_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state.db, auth_user.user_id()?, auth_user.role(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/submit",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course submitted for review", body = TransitionResponse),
        (status = 400, description = "Not a draft, deadline passed, or incomplete"),
        (status = 403, description = "Not the creator or staff"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn submit_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let course = CourseService::submit_course(
        &state.db,
        &state.email_service,
        auth_user.user_id()?,
        auth_user.role(),
        id,
    )
    .await?;
    Ok(Json(TransitionResponse {
        course_id: course.id,
        status: course.status,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/review",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course moved under review", body = TransitionResponse),
        (status = 400, description = "Course is not in the submitted state"),
        (status = 403, description = "Admin or department head only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn start_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let course = CourseService::start_review(&state.db, auth_user.role(), id).await?;
    Ok(Json(TransitionResponse {
        course_id: course.id,
        status: course.status,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/approve",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course approved", body = TransitionResponse),
        (status = 400, description = "Course is not under review"),
        (status = 403, description = "Admin or department head only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn approve_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let course = CourseService::approve_course(&state.db, auth_user.role(), id).await?;
    Ok(Json(TransitionResponse {
        course_id: course.id,
        status: course.status,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/reject",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course rejected", body = TransitionResponse),
        (status = 400, description = "Course is not under review"),
        (status = 403, description = "Admin or department head only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn reject_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let course = CourseService::reject_course(&state.db, auth_user.role(), id).await?;
    Ok(Json(TransitionResponse {
        course_id: course.id,
        status: course.status,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/publish",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course published", body = TransitionResponse),
        (status = 400, description = "Course is not approved"),
        (status = 403, description = "Admin or department head only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn publish_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let course =
        CourseService::publish_course(&state.db, &state.email_service, auth_user.role(), id)
            .await?;
    Ok(Json(TransitionResponse {
        course_id: course.id,
        status: course.status,
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/summary",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Summary uploaded", body = CourseDetails),
        (status = 400, description = "File too large or unsupported type"),
        (status = 403, description = "Not the creator or staff"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
pub async fn upload_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<CourseDetails>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or_else(|| {
                    AppError::bad_request(anyhow::anyhow!("Summary file must have a filename"))
                })?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(anyhow::anyhow!("Failed to read file: {}", e)))?;
            file = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Missing 'file' field")))?;

    CourseService::upload_summary(
        &state.db,
        state.storage.as_ref(),
        auth_user.user_id()?,
        auth_user.role(),
        id,
        &filename,
        bytes,
    )
    .await?;

    let course =
        CourseService::get_course(&state.db, auth_user.user_id()?, auth_user.role(), id).await?;
    Ok(Json(course))
}
