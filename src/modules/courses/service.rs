use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::notifications::dispatcher::NotificationDispatcher;
use crate::modules::users::model::UserRole;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::files::{FileStorage, SummaryValidator};
use crate::utils::pagination::PaginationMeta;

use super::model::{
    Course, CourseDetails, CourseFilterParams, CourseStatus, CreateCourseDto,
    PaginatedCoursesResponse, TeamMember, TeamMemberDto, UpdateCourseDto,
};
use super::policy;
use super::workflow;

const COURSE_COLUMNS: &str = "id, title, description, supplier_type, status, objectives, contents, duration, expected_income, links, summary_path, submission_deadline, created_by, created_at, updated_at";

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, dto), fields(course.title = %dto.title, actor.id = %actor_id, db.operation = "INSERT", db.table = "courses"))]
    pub async fn create_course(
        db: &PgPool,
        actor_id: Uuid,
        actor_role: UserRole,
        dto: CreateCourseDto,
    ) -> Result<CourseDetails, AppError> {
        if !policy::can_create_course(actor_role) {
            return Err(AppError::forbidden(
                "Only trainers, department heads, or admins can create courses",
            ));
        }

        let mut tx = db.begin().await.map_err(AppError::from)?;

        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (title, description, supplier_type, objectives, contents, duration, expected_income, links, submission_deadline, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.supplier_type)
        .bind(&dto.objectives)
        .bind(&dto.contents)
        .bind(&dto.duration)
        .bind(&dto.expected_income)
        .bind(&dto.links)
        .bind(dto.submission_deadline)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error creating course");
            AppError::from(e)
        })?;

        if let Some(members) = &dto.team_members {
            Self::reconcile_team(&mut tx, course.id, members).await?;
        }

        tx.commit().await.map_err(AppError::from)?;

        info!(course.id = %course.id, course.status = %course.status, "Course created successfully");

        let team_members = Self::get_team(db, course.id).await?;
        Ok(CourseDetails {
            course,
            team_members,
        })
    }

    /// Staff see every course; everyone else only their own.
    #[instrument(skip(db, filters), fields(actor.id = %actor_id, db.operation = "SELECT", db.table = "courses"))]
    pub async fn get_courses(
        db: &PgPool,
        actor_id: Uuid,
        actor_role: UserRole,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::new();
        let mut params = Vec::new();

        if !actor_role.is_staff() {
            params.push(actor_id.to_string());
            where_clause.push_str(&format!(" AND created_by = ${}::uuid", params.len()));
        }

        if let Some(status) = filters.status {
            params.push(status.to_string());
            where_clause.push_str(&format!(" AND status = ${}::course_status", params.len()));
        }

        let count_query = format!("SELECT COUNT(*) FROM courses WHERE 1=1{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await.map_err(|e| {
            error!(error = %e, "Database error counting courses");
            AppError::from(e)
        })?;

        let data_query = format!(
            "SELECT {} FROM courses WHERE 1=1{} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            COURSE_COLUMNS, where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, Course>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let courses = data_sql.fetch_all(db).await.map_err(|e| {
            error!(error = %e, "Database error fetching courses");
            AppError::from(e)
        })?;

        let has_more = offset + limit < total;

        debug!(total = %total, returned = %courses.len(), "Courses fetched successfully");

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more,
            },
        })
    }

    /// Retrieval is scoped like listing: non-staff only see their own
    /// courses, and a foreign course is indistinguishable from a missing
    /// one.
    #[instrument(skip(db), fields(course.id = %course_id, actor.id = %actor_id, db.operation = "SELECT", db.table = "courses"))]
    pub async fn get_course(
        db: &PgPool,
        actor_id: Uuid,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<CourseDetails, AppError> {
        let course = Self::get_course_row(db, course_id).await?;

        if !actor_role.is_staff() && course.created_by != actor_id {
            debug!(course.id = %course_id, actor.id = %actor_id, "Course hidden from non-creator");
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        let team_members = Self::get_team(db, course_id).await?;
        Ok(CourseDetails {
            course,
            team_members,
        })
    }

    #[instrument(skip(db, dto), fields(course.id = %course_id, actor.id = %actor_id, db.operation = "UPDATE", db.table = "courses"))]
    pub async fn update_course(
        db: &PgPool,
        actor_id: Uuid,
        actor_role: UserRole,
        course_id: Uuid,
        dto: UpdateCourseDto,
    ) -> Result<CourseDetails, AppError> {
        let course = Self::get_course_row(db, course_id).await?;

        if !policy::can_modify_course(actor_role, actor_id, course.created_by) {
            return Err(AppError::forbidden("You can only update courses you created"));
        }

        let mut tx = db.begin().await.map_err(AppError::from)?;

        let course = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 supplier_type = COALESCE($4, supplier_type),
                 objectives = COALESCE($5, objectives),
                 contents = COALESCE($6, contents),
                 duration = COALESCE($7, duration),
                 expected_income = COALESCE($8, expected_income),
                 links = COALESCE($9, links),
                 submission_deadline = COALESCE($10, submission_deadline),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .bind(dto.title.as_deref())
        .bind(dto.description.as_deref())
        .bind(dto.supplier_type)
        .bind(dto.objectives.as_deref())
        .bind(dto.contents.as_deref())
        .bind(dto.duration.as_deref())
        .bind(dto.expected_income.as_deref())
        .bind(dto.links.as_deref())
        .bind(dto.submission_deadline)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!(course.id = %course_id, error = %e, "Database error updating course");
            AppError::from(e)
        })?;

        if let Some(members) = &dto.team_members {
            Self::reconcile_team(&mut tx, course_id, members).await?;
        }

        tx.commit().await.map_err(AppError::from)?;

        info!(course.id = %course_id, "Course updated successfully");

        let team_members = Self::get_team(db, course_id).await?;
        Ok(CourseDetails {
            course,
            team_members,
        })
    }

    /// Deletion is a DRAFT-only operation, even for admins.
    #[instrument(skip(db), fields(course.id = %course_id, actor.id = %actor_id, db.operation = "DELETE", db.table = "courses"))]
    pub async fn delete_course(
        db: &PgPool,
        actor_id: Uuid,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<(), AppError> {
        let course = Self::get_course_row(db, course_id).await?;

        if course.status != CourseStatus::Draft {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Only draft courses can be deleted"
            )));
        }

        if !policy::can_modify_course(actor_role, actor_id, course.created_by) {
            return Err(AppError::forbidden("You can only delete courses you created"));
        }

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(db)
            .await
            .map_err(|e| {
                error!(course.id = %course_id, error = %e, "Database error deleting course");
                AppError::from(e)
            })?;

        info!(course.id = %course_id, "Course deleted successfully");

        Ok(())
    }

    #[instrument(skip(db, email), fields(course.id = %course_id, actor.id = %actor_id))]
    pub async fn submit_course(
        db: &PgPool,
        email: &EmailService,
        actor_id: Uuid,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<Course, AppError> {
        let course = Self::get_course_row(db, course_id).await?;

        if !policy::can_modify_course(actor_role, actor_id, course.created_by) {
            return Err(AppError::forbidden("You can only submit courses you created"));
        }

        workflow::validate_submission(&course, Utc::now())?;

        let course =
            Self::transition(db, course_id, CourseStatus::Draft, CourseStatus::Submitted).await?;

        info!(course.id = %course_id, "Course submitted for review");

        // Fan-out is best-effort: a dispatch failure never rolls back the
        // committed transition.
        if let Err(e) = NotificationDispatcher::course_submitted(db, email, &course).await {
            warn!(course.id = %course_id, error = %e.error, "Submission notification dispatch failed");
        }

        Ok(course)
    }

    #[instrument(skip(db), fields(course.id = %course_id))]
    pub async fn start_review(
        db: &PgPool,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<Course, AppError> {
        if !policy::can_review_course(actor_role) {
            return Err(AppError::forbidden(
                "Only admins or department heads can review courses",
            ));
        }

        let _ = Self::get_course_row(db, course_id).await?;
        let course = Self::transition(
            db,
            course_id,
            CourseStatus::Submitted,
            CourseStatus::UnderReview,
        )
        .await?;

        info!(course.id = %course_id, "Course review started");

        Ok(course)
    }

    #[instrument(skip(db), fields(course.id = %course_id))]
    pub async fn approve_course(
        db: &PgPool,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<Course, AppError> {
        if !policy::can_review_course(actor_role) {
            return Err(AppError::forbidden(
                "Only admins or department heads can approve courses",
            ));
        }

        let _ = Self::get_course_row(db, course_id).await?;
        let course = Self::transition(
            db,
            course_id,
            CourseStatus::UnderReview,
            CourseStatus::Approved,
        )
        .await?;

        info!(course.id = %course_id, "Course approved");

        Ok(course)
    }

    #[instrument(skip(db), fields(course.id = %course_id))]
    pub async fn reject_course(
        db: &PgPool,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<Course, AppError> {
        if !policy::can_review_course(actor_role) {
            return Err(AppError::forbidden(
                "Only admins or department heads can reject courses",
            ));
        }

        let _ = Self::get_course_row(db, course_id).await?;
        let course = Self::transition(
            db,
            course_id,
            CourseStatus::UnderReview,
            CourseStatus::Rejected,
        )
        .await?;

        info!(course.id = %course_id, "Course rejected");

        Ok(course)
    }

    #[instrument(skip(db, email), fields(course.id = %course_id))]
    pub async fn publish_course(
        db: &PgPool,
        email: &EmailService,
        actor_role: UserRole,
        course_id: Uuid,
    ) -> Result<Course, AppError> {
        if !policy::can_publish_course(actor_role) {
            return Err(AppError::forbidden(
                "Only admins or department heads can publish courses",
            ));
        }

        let _ = Self::get_course_row(db, course_id).await?;
        let course = Self::transition(
            db,
            course_id,
            CourseStatus::Approved,
            CourseStatus::Published,
        )
        .await?;

        info!(course.id = %course_id, "Course published");

        if let Err(e) = NotificationDispatcher::course_published(db, email, &course).await {
            warn!(course.id = %course_id, error = %e.error, "Publication notification dispatch failed");
        }

        Ok(course)
    }

    #[instrument(skip(db, storage, file_bytes), fields(course.id = %course_id, actor.id = %actor_id, file.size = file_bytes.len(), db.operation = "UPDATE", db.table = "courses"))]
    pub async fn upload_summary(
        db: &PgPool,
        storage: &dyn FileStorage,
        actor_id: Uuid,
        actor_role: UserRole,
        course_id: Uuid,
        filename: &str,
        file_bytes: Vec<u8>,
    ) -> Result<Course, AppError> {
        let course = Self::get_course_row(db, course_id).await?;

        if !policy::can_modify_course(actor_role, actor_id, course.created_by) {
            return Err(AppError::forbidden(
                "You can only attach a summary to courses you created",
            ));
        }

        SummaryValidator::validate(filename, file_bytes.len())?;

        if let Some(old_path) = &course.summary_path {
            debug!(course.id = %course_id, old_path = %old_path, "Deleting previous summary");
            let _ = storage.delete(old_path).await;
        }

        let now = Utc::now().timestamp_millis();
        let ext = SummaryValidator::extension(filename);
        let storage_key = format!("courses/{}-{}.{}", course_id, now, ext);

        storage
            .save(&storage_key, &file_bytes)
            .await
            .map_err(|e| {
                error!(course.id = %course_id, error = %e, "Failed to save course summary");
                AppError::internal(anyhow::anyhow!("Failed to save summary: {}", e))
            })?;

        let course = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET summary_path = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .bind(&storage_key)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(course.id = %course_id, error = %e, "Database error updating summary path");
            AppError::from(e)
        })?;

        info!(course.id = %course_id, storage_key = %storage_key, "Course summary uploaded");

        Ok(course)
    }

    #[instrument(skip(db), fields(course.id = %course_id, db.operation = "SELECT", db.table = "team_members"))]
    pub async fn get_team(db: &PgPool, course_id: Uuid) -> Result<Vec<TeamMember>, AppError> {
        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT tm.id, tm.full_name, tm.qualification, tm.email
             FROM team_members tm
             INNER JOIN course_team ct ON ct.team_member_id = tm.id
             WHERE ct.course_id = $1
             ORDER BY tm.full_name",
        )
        .bind(course_id)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(course.id = %course_id, error = %e, "Database error fetching course team");
            AppError::from(e)
        })?;

        Ok(members)
    }

    async fn get_course_row(db: &PgPool, course_id: Uuid) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(course.id = %course_id, error = %e, "Database error fetching course");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            debug!(course.id = %course_id, "Course not found");
            AppError::not_found(anyhow::anyhow!("Course not found"))
        })
    }

    /// Compare-and-set status transition. The WHERE clause pins the
    /// expected state, so two racing transitions cannot both win; the
    /// loser sees zero rows and gets a state error.
    async fn transition(
        db: &PgPool,
        course_id: Uuid,
        from: CourseStatus,
        to: CourseStatus,
    ) -> Result<Course, AppError> {
        debug_assert!(from.can_transition_to(to));

        let updated = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .bind(from)
        .bind(to)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(course.id = %course_id, error = %e, "Database error on status transition");
            AppError::from(e)
        })?;

        updated.ok_or_else(|| {
            debug!(course.id = %course_id, expected = %from, "Status transition lost: course not in expected state");
            AppError::bad_request(anyhow::anyhow!(
                "Course is not in the {} state",
                from
            ))
        })
    }

    /// Full-replace roster reconciliation: clear the course's pairings,
    /// upsert each member by email (last occurrence wins), re-pair with
    /// conflict-ignore so a duplicated email yields exactly one pairing.
    async fn reconcile_team(
        tx: &mut Transaction<'_, Postgres>,
        course_id: Uuid,
        members: &[TeamMemberDto],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM course_team WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                error!(course.id = %course_id, error = %e, "Database error clearing course team");
                AppError::from(e)
            })?;

        for member in members {
            let member_id = sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO team_members (full_name, qualification, email)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (email) DO UPDATE
                     SET full_name = EXCLUDED.full_name,
                         qualification = EXCLUDED.qualification,
                         updated_at = NOW()
                 RETURNING id",
            )
            .bind(&member.full_name)
            .bind(&member.qualification)
            .bind(&member.email)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                error!(course.id = %course_id, member.email = %member.email, error = %e, "Database error upserting team member");
                AppError::from(e)
            })?;

            sqlx::query(
                "INSERT INTO course_team (course_id, team_member_id)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(course_id)
            .bind(member_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                error!(course.id = %course_id, error = %e, "Database error pairing team member");
                AppError::from(e)
            })?;
        }

        debug!(course.id = %course_id, roster_size = members.len(), "Course team reconciled");

        Ok(())
    }
}
