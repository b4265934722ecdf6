use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::users::model::{User, UserRole};
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::password::verify_password;

use super::model::{LoginRequest, LoginResponse};

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: Uuid,
            first_name: String,
            last_name: String,
            email: String,
            password: String,
            role: UserRole,
            department_id: Option<Uuid>,
            department_name: Option<String>,
            phone: String,
            education_level: String,
            profession: String,
            is_active: bool,
            created_at: chrono::DateTime<chrono::Utc>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        let row = sqlx::query_as::<_, UserWithPassword>(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.password, u.role,
                    u.department_id, d.name AS department_name, u.phone,
                    u.education_level, u.profession, u.is_active, u.created_at, u.updated_at
             FROM users u
             LEFT JOIN departments d ON d.id = u.department_id
             WHERE u.email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        if !verify_password(&dto.password, &row.password)? {
            warn!(user.email = %dto.email, "Login failed: bad password");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        if !row.is_active {
            warn!(user.email = %dto.email, "Login rejected: account inactive");
            return Err(AppError::unauthorized("Account is deactivated"));
        }

        let access_token = create_access_token(
            row.id,
            &row.email,
            row.role,
            row.department_name.clone(),
            jwt_config,
        )?;

        info!(user.id = %row.id, user.role = %row.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            user: User {
                id: row.id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                role: row.role,
                department_id: row.department_id,
                phone: row.phone,
                education_level: row.education_level,
                profession: row.profession,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            department: row.department_name,
        })
    }
}
