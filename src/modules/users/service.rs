use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;
use crate::utils::password::hash_password;

use super::model::{
    CreateUserDto, LinkChildDto, PaginatedUsersResponse, ParentChildRelationship, User,
    UserFilterParams, UserRole,
};

pub struct UserService;

impl UserService {
    #[instrument(skip(db, dto), fields(user.email = %dto.email, db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        debug!(user.role = %dto.role, "Creating new user");

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (first_name, last_name, email, password, role, department_id, phone, education_level, profession)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id, first_name, last_name, email, role, department_id, phone, education_level, profession, is_active, created_at, updated_at",
        )
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(dto.role)
        .bind(dto.department_id)
        .bind(&dto.phone)
        .bind(&dto.education_level)
        .bind(&dto.profession)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    warn!(user.email = %dto.email, "Attempted to create user with existing email");
                    return AppError::bad_request(anyhow::anyhow!("Email already exists"));
                }
            }
            error!(error = %e, user.email = %dto.email, "Database error creating user");
            AppError::from(e)
        })?;

        info!(user.id = %user.id, user.role = %user.role, "User created successfully");

        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        debug!(
            limit = %limit,
            offset = %offset,
            filter.role = ?filters.role,
            filter.email = ?filters.email,
            "Fetching users with pagination"
        );

        let mut where_clause = String::new();
        let mut params = Vec::new();

        if let Some(role) = filters.role {
            params.push(role.to_string());
            where_clause.push_str(&format!(" AND role = ${}::user_role", params.len()));
        }

        if let Some(email) = &filters.email {
            params.push(format!("%{}%", email));
            where_clause.push_str(&format!(" AND email ILIKE ${}", params.len()));
        }

        if let Some(last_name) = &filters.last_name {
            params.push(format!("%{}%", last_name));
            where_clause.push_str(&format!(" AND last_name ILIKE ${}", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM users WHERE 1=1{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await.map_err(|e| {
            error!(error = %e, "Database error counting users");
            AppError::from(e)
        })?;

        let data_query = format!(
            "SELECT id, first_name, last_name, email, role, department_id, phone, education_level, profession, is_active, created_at, updated_at
             FROM users WHERE 1=1{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, User>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let users = data_sql.fetch_all(db).await.map_err(|e| {
            error!(error = %e, "Database error fetching users");
            AppError::from(e)
        })?;

        let has_more = offset + limit < total;

        debug!(total = %total, returned = %users.len(), "Users fetched successfully");

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more,
            },
        })
    }

    #[instrument(skip(db), fields(user.id = %user_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user_by_id(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, role, department_id, phone, education_level, profession, is_active, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, error = %e, "Database error fetching user");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            debug!(user.id = %user_id, "User not found");
            AppError::not_found(anyhow::anyhow!("User not found"))
        })?;

        Ok(user)
    }

    /// Link a learner to a parent. The pair is unique; re-linking the same
    /// child is rejected.
    #[instrument(skip(db), fields(parent.id = %parent_id, child.id = %dto.child_id, db.operation = "INSERT", db.table = "parent_child_relationships"))]
    pub async fn link_child(
        db: &PgPool,
        parent_id: Uuid,
        dto: LinkChildDto,
    ) -> Result<ParentChildRelationship, AppError> {
        let parent = Self::get_user_by_id(db, parent_id).await?;
        if parent.role != UserRole::Parent {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User {} does not have the parent role",
                parent_id
            )));
        }

        let child = Self::get_user_by_id(db, dto.child_id).await?;
        if child.role != UserRole::Learner {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User {} does not have the learner role",
                dto.child_id
            )));
        }

        let link = sqlx::query_as::<_, ParentChildRelationship>(
            "INSERT INTO parent_child_relationships (parent_id, child_id, relationship)
             VALUES ($1, $2, $3)
             RETURNING parent_id, child_id, relationship, created_at",
        )
        .bind(parent_id)
        .bind(dto.child_id)
        .bind(&dto.relationship)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    warn!(parent.id = %parent_id, child.id = %dto.child_id, "Duplicate parent-child link");
                    return AppError::bad_request(anyhow::anyhow!(
                        "This parent is already linked to this learner"
                    ));
                }
            }
            error!(error = %e, "Database error linking parent and child");
            AppError::from(e)
        })?;

        info!(parent.id = %parent_id, child.id = %dto.child_id, "Parent linked to learner");

        Ok(link)
    }

    #[instrument(skip(db), fields(parent.id = %parent_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get_children(db: &PgPool, parent_id: Uuid) -> Result<Vec<User>, AppError> {
        let children = sqlx::query_as::<_, User>(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.role, u.department_id, u.phone, u.education_level, u.profession, u.is_active, u.created_at, u.updated_at
             FROM users u
             INNER JOIN parent_child_relationships pcr ON pcr.child_id = u.id
             WHERE pcr.parent_id = $1
             ORDER BY u.last_name, u.first_name",
        )
        .bind(parent_id)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(parent.id = %parent_id, error = %e, "Database error fetching children");
            AppError::from(e)
        })?;

        Ok(children)
    }
}
