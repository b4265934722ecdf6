use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{
    Notification, NotificationFilterParams, PaginatedNotificationsResponse, UnreadCountResponse,
};
use super::service::NotificationService;

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("limit" = Option<i64>, Query, description = "Limit number of results"),
        ("offset" = Option<i64>, Query, description = "Offset for pagination")
    ),
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = PaginatedNotificationsResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    filters: Result<Query<NotificationFilterParams>, QueryRejection>,
) -> Result<Json<PaginatedNotificationsResponse>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;

    let notifications =
        NotificationService::get_notifications(&state.db, auth_user.user_id()?, filters).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Count of unread notifications", body = UnreadCountResponse)
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = NotificationService::unread_count(&state.db, auth_user.user_id()?).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification =
        NotificationService::mark_read(&state.db, auth_user.user_id()?, id).await?;
    Ok(Json(notification))
}
