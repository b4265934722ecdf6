use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateUserDto, LinkChildDto, PaginatedUsersResponse, ParentChildRelationship, User,
    UserFilterParams,
};
use super::service::UserService;

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 200, description = "User created successfully", body = User),
        (status = 400, description = "Email already exists"),
        (status = 403, description = "Forbidden - admin or department head only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("role" = Option<String>, Query, description = "Filter by role"),
        ("email" = Option<String>, Query, description = "Filter by email (partial match)"),
        ("last_name" = Option<String>, Query, description = "Filter by last name (partial match)"),
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination")
    ),
    responses(
        (status = 200, description = "Paginated list of users", body = PaginatedUsersResponse),
        (status = 403, description = "Forbidden - admin or department head only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    filters: Result<Query<UserFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user_by_id(&state.db, id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/children",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    request_body = LinkChildDto,
    responses(
        (status = 200, description = "Learner linked to parent", body = ParentChildRelationship),
        (status = 400, description = "Role mismatch or duplicate link"),
        (status = 404, description = "Parent or learner not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn link_child(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<LinkChildDto>,
) -> Result<Json<ParentChildRelationship>, AppError> {
    let link = UserService::link_child(&state.db, id, dto).await?;
    Ok(Json(link))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/children",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    responses(
        (status = 200, description = "Learners linked to this parent", body = Vec<User>)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_children(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, AppError> {
    let children = UserService::get_children(&state.db, id).await?;
    Ok(Json(children))
}
