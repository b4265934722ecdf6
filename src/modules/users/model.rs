//! User data models and DTOs.
//!
//! The role enum is a flat classification: authorization predicates test
//! membership directly, there is no hierarchy. Parents are linked to
//! learners through `parent_child_relationships`, unique per pair.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Flat user role classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Learner,
    Formateur,
    Responsable,
    Secretaire,
    Admin,
    Marketing,
    Parent,
}

impl UserRole {
    /// Admins and department heads: the reviewer/publisher population.
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Responsable)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Learner => "learner",
            UserRole::Formateur => "formateur",
            UserRole::Responsable => "responsable",
            UserRole::Secretaire => "secretaire",
            UserRole::Admin => "admin",
            UserRole::Marketing => "marketing",
            UserRole::Parent => "parent",
        };
        f.write_str(s)
    }
}

/// A user as returned by the API. The password hash never leaves the
/// auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Option<Uuid>,
    pub phone: String,
    pub education_level: String,
    pub profession: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for creating a user (admin only).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, message = "first_name must not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name must not be empty"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub education_level: String,
    #[serde(default)]
    pub profession: String,
}

/// Query parameters for filtering users.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    pub email: Option<String>,
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: crate::utils::pagination::PaginationMeta,
}

/// A parent-learner link, unique per (parent, child) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParentChildRelationship {
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub relationship: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for linking a learner to a parent.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LinkChildDto {
    pub child_id: Uuid,
    #[validate(length(min = 1, message = "relationship must not be empty"))]
    #[serde(default = "default_relationship")]
    pub relationship: String,
}

fn default_relationship() -> String {
    "parent".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&UserRole::Responsable).unwrap(),
            r#""responsable""#
        );
        assert_eq!(
            serde_json::from_str::<UserRole>(r#""formateur""#).unwrap(),
            UserRole::Formateur
        );
    }

    #[test]
    fn test_is_staff_covers_admin_and_responsable_only() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Responsable.is_staff());
        for role in [
            UserRole::Learner,
            UserRole::Formateur,
            UserRole::Secretaire,
            UserRole::Marketing,
            UserRole::Parent,
        ] {
            assert!(!role.is_staff());
        }
    }
}
