use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{CreateDepartmentDto, Department};

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db, dto), fields(department.name = %dto.name, db.operation = "INSERT", db.table = "departments"))]
    pub async fn create_department(
        db: &PgPool,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name, language, description)
             VALUES ($1, $2, $3)
             RETURNING id, name, language, description, created_at, updated_at",
        )
        .bind(&dto.name)
        .bind(&dto.language)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    warn!(department.name = %dto.name, "Attempted to create department with existing name");
                    return AppError::bad_request(anyhow::anyhow!("Department name already exists"));
                }
            }
            error!(error = %e, "Database error creating department");
            AppError::from(e)
        })?;

        info!(department.id = %department.id, "Department created successfully");

        Ok(department)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "departments"))]
    pub async fn get_departments(db: &PgPool) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, name, language, description, created_at, updated_at
             FROM departments ORDER BY name",
        )
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching departments");
            AppError::from(e)
        })?;

        Ok(departments)
    }

    #[instrument(skip(db), fields(department.id = %department_id, db.operation = "SELECT", db.table = "departments"))]
    pub async fn get_department_by_id(
        db: &PgPool,
        department_id: Uuid,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, language, description, created_at, updated_at
             FROM departments WHERE id = $1",
        )
        .bind(department_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(department.id = %department_id, error = %e, "Database error fetching department");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            debug!(department.id = %department_id, "Department not found");
            AppError::not_found(anyhow::anyhow!("Department not found"))
        })?;

        Ok(department)
    }

    #[instrument(skip(db), fields(department.id = %department_id, db.operation = "DELETE", db.table = "departments"))]
    pub async fn delete_department(db: &PgPool, department_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(department_id)
            .execute(db)
            .await
            .map_err(|e| {
                error!(department.id = %department_id, error = %e, "Database error deleting department");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Department not found")));
        }

        info!(department.id = %department_id, "Department deleted successfully");

        Ok(())
    }
}
