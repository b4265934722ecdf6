//! Course entity, enums and DTOs.
//!
//! `status` is only ever written through the workflow transitions in the
//! service; it is read-only in every DTO, matching the invariant that a
//! course moves exclusively along the defined transition graph.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Course lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "course_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Published,
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Submitted => "submitted",
            CourseStatus::UnderReview => "under_review",
            CourseStatus::Approved => "approved",
            CourseStatus::Rejected => "rejected",
            CourseStatus::Published => "published",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supplier_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    Internal,
    External,
    Hod,
}

/// A course moving through the draft-to-published workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub supplier_type: SupplierType,
    pub status: CourseStatus,
    pub objectives: String,
    pub contents: String,
    pub duration: String,
    pub expected_income: String,
    pub links: String,
    pub summary_path: Option<String>,
    pub submission_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// An external instructor, identified by email, not a system user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeamMember {
    pub id: Uuid,
    pub full_name: String,
    pub qualification: String,
    pub email: String,
}

/// One roster entry as supplied on course create/update.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TeamMemberDto {
    #[validate(length(min = 1, message = "team member full_name must not be empty"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "team member qualification must not be empty"))]
    pub qualification: String,
    #[validate(email(message = "team member email must be a valid address"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub supplier_type: SupplierType,
    #[serde(default)]
    pub objectives: String,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub expected_income: String,
    #[serde(default)]
    pub links: String,
    pub submission_deadline: Option<chrono::DateTime<chrono::Utc>>,
    #[validate(nested)]
    pub team_members: Option<Vec<TeamMemberDto>>,
}

/// Partial update; `status` and `created_by` are never writable here.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub supplier_type: Option<SupplierType>,
    pub objectives: Option<String>,
    pub contents: Option<String>,
    pub duration: Option<String>,
    pub expected_income: Option<String>,
    pub links: Option<String>,
    pub submission_deadline: Option<chrono::DateTime<chrono::Utc>>,
    #[validate(nested)]
    pub team_members: Option<Vec<TeamMemberDto>>,
}

/// Course plus its reconciled roster.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetails {
    #[serde(flatten)]
    pub course: Course,
    pub team_members: Vec<TeamMember>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CourseFilterParams {
    pub status: Option<CourseStatus>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<Course>,
    pub meta: crate::utils::pagination::PaginationMeta,
}

/// Returned by every transition endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub course_id: Uuid,
    pub status: CourseStatus,
}
