//! OpenAPI documentation, served through Swagger UI and Scalar.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::modules::auth::controller as auth;
use crate::modules::auth::model::{LoginRequest, LoginResponse};
use crate::modules::courses::controller as courses;
use crate::modules::courses::model::{
    Course, CourseDetails, CourseStatus, CreateCourseDto, PaginatedCoursesResponse, SupplierType,
    TeamMember, TeamMemberDto, TransitionResponse, UpdateCourseDto,
};
use crate::modules::departments::controller as departments;
use crate::modules::departments::model::{CreateDepartmentDto, Department};
use crate::modules::notifications::controller as notifications;
use crate::modules::notifications::model::{
    Notification, PaginatedNotificationsResponse, UnreadCountResponse,
};
use crate::modules::users::controller as users;
use crate::modules::users::model::{
    CreateUserDto, LinkChildDto, PaginatedUsersResponse, ParentChildRelationship, User, UserRole,
};
use crate::utils::pagination::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OETS API",
        description = "Online Education & Training System backend",
        version = "0.1.0"
    ),
    paths(
        auth::login_user,
        auth::get_profile,
        users::create_user,
        users::get_users,
        users::get_user,
        users::link_child,
        users::get_children,
        departments::create_department,
        departments::get_departments,
        departments::get_department,
        departments::delete_department,
        courses::create_course,
        courses::get_courses,
        courses::get_course,
        courses::update_course,
        courses::delete_course,
        courses::submit_course,
        courses::start_review,
        courses::approve_course,
        courses::reject_course,
        courses::publish_course,
        courses::upload_summary,
        notifications::get_notifications,
        notifications::unread_count,
        notifications::mark_read,
        crate::router::health_check,
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        User,
        UserRole,
        CreateUserDto,
        PaginatedUsersResponse,
        ParentChildRelationship,
        LinkChildDto,
        Department,
        CreateDepartmentDto,
        Course,
        CourseStatus,
        SupplierType,
        TeamMember,
        TeamMemberDto,
        CreateCourseDto,
        UpdateCourseDto,
        CourseDetails,
        PaginatedCoursesResponse,
        TransitionResponse,
        Notification,
        PaginatedNotificationsResponse,
        UnreadCountResponse,
        PaginationMeta,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and session identity"),
        (name = "Users", description = "User administration"),
        (name = "Departments", description = "Department administration"),
        (name = "Courses", description = "Course lifecycle and team rosters"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
