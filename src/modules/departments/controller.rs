use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateDepartmentDto, Department};
use super::service::DepartmentService;

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentDto,
    responses(
        (status = 200, description = "Department created successfully", body = Department),
        (status = 403, description = "Forbidden - admin or department head only")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<Json<Department>, AppError> {
    let department = DepartmentService::create_department(&state.db, dto).await?;
    Ok(Json(department))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "All departments", body = Vec<Department>)
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn get_departments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Department>>, AppError> {
    let departments = DepartmentService::get_departments(&state.db).await?;
    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department details", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn get_department(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Department>, AppError> {
    let department = DepartmentService::get_department_by_id(&state.db, id).await?;
    Ok(Json(department))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn delete_department(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    DepartmentService::delete_department(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
