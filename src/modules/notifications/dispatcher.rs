//! Fan-out of workflow events to in-app notifications and email.
//!
//! Dispatch runs after the status transition has committed and is
//! best-effort per recipient: one failed insert or send is logged and
//! skipped, never propagated back to the caller, and never rolls the
//! transition back.

use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::modules::courses::model::{Course, TeamMember};
use crate::modules::users::model::{User, UserRole};
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;

/// Counts of what a dispatch actually managed to deliver.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub notifications: usize,
    pub emails: usize,
    pub failures: usize,
}

pub struct NotificationDispatcher;

impl NotificationDispatcher {
    /// A course entered SUBMITTED: confirm to the creator, alert every
    /// active admin and department head.
    #[instrument(skip(db, email, course), fields(course.id = %course.id))]
    pub async fn course_submitted(
        db: &PgPool,
        email: &EmailService,
        course: &Course,
    ) -> Result<DispatchSummary, AppError> {
        let mut summary = DispatchSummary::default();

        let creator = Self::fetch_user(db, course.created_by).await?;

        let subject = format!("Course '{}' submitted", course.title);
        let message = format!(
            "Your course '{}' has been submitted and is awaiting review.",
            course.title
        );
        Self::notify_and_email(db, email, &creator, &subject, &message, course.id, &mut summary)
            .await;

        let reviewers = Self::fetch_active_by_roles(db, &[UserRole::Admin, UserRole::Responsable])
            .await?;

        let subject = format!("Course '{}' awaiting review", course.title);
        for reviewer in &reviewers {
            let message = format!(
                "{} submitted the course '{}' for review.",
                creator.full_name(),
                course.title
            );
            Self::notify_and_email(db, email, reviewer, &subject, &message, course.id, &mut summary)
                .await;
        }

        info!(
            course.id = %course.id,
            notifications = summary.notifications,
            emails = summary.emails,
            failures = summary.failures,
            "Submission fan-out complete"
        );

        Ok(summary)
    }

    /// A course entered PUBLISHED: announce to trainers, the course team,
    /// learners and their parents; staff get an email but no in-app record.
    #[instrument(skip(db, email, course), fields(course.id = %course.id))]
    pub async fn course_published(
        db: &PgPool,
        email: &EmailService,
        course: &Course,
    ) -> Result<DispatchSummary, AppError> {
        let mut summary = DispatchSummary::default();

        let subject = format!("New course published: {}", course.title);

        let trainers = Self::fetch_active_by_roles(db, &[UserRole::Formateur]).await?;
        for trainer in &trainers {
            let message = format!(
                "The course '{}' has been published and is now available.",
                course.title
            );
            Self::notify_and_email(db, email, trainer, &subject, &message, course.id, &mut summary)
                .await;
        }

        // External instructors are not system users, so email is the only
        // channel they have.
        let team = Self::fetch_course_team(db, course.id).await?;
        for member in &team {
            let message = format!(
                "The course '{}' you are part of has been published.",
                course.title
            );
            Self::email_only(
                email,
                &member.email,
                &member.full_name,
                &subject,
                message,
                &mut summary,
            )
            .await;
        }

        let learners = Self::fetch_active_by_roles(db, &[UserRole::Learner]).await?;
        for learner in &learners {
            let message = format!(
                "A new course '{}' is now open for enrollment.",
                course.title
            );
            Self::notify_and_email(db, email, learner, &subject, &message, course.id, &mut summary)
                .await;

            let parents = Self::fetch_linked_parents(db, learner.id).await?;
            for parent in &parents {
                let message = format!(
                    "A new course '{}' is now available for {}.",
                    course.title,
                    learner.full_name()
                );
                Self::notify_and_email(
                    db,
                    email,
                    parent,
                    &subject,
                    &message,
                    course.id,
                    &mut summary,
                )
                .await;
            }
        }

        let unlinked_parents = Self::fetch_unlinked_parents(db).await?;
        for parent in &unlinked_parents {
            let message = format!("A new course '{}' has been published.", course.title);
            Self::notify_and_email(db, email, parent, &subject, &message, course.id, &mut summary)
                .await;
        }

        let staff = Self::fetch_active_by_roles(db, &[UserRole::Admin, UserRole::Responsable])
            .await?;
        for member in &staff {
            let message = format!("The course '{}' has been published.", course.title);
            Self::email_only(
                email,
                &member.email,
                &member.full_name(),
                &subject,
                message,
                &mut summary,
            )
            .await;
        }

        info!(
            course.id = %course.id,
            notifications = summary.notifications,
            emails = summary.emails,
            failures = summary.failures,
            "Publication fan-out complete"
        );

        Ok(summary)
    }

    /// Persist a notification row then send the matching email. Each step
    /// fails independently; a dead SMTP relay does not lose the in-app
    /// record.
    async fn notify_and_email(
        db: &PgPool,
        email: &EmailService,
        recipient: &User,
        subject: &str,
        message: &str,
        course_id: Uuid,
        summary: &mut DispatchSummary,
    ) {
        match Self::insert_notification(db, recipient.id, subject, message, course_id).await {
            Ok(()) => summary.notifications += 1,
            Err(e) => {
                warn!(recipient.id = %recipient.id, error = %e.error, "Failed to persist notification");
                summary.failures += 1;
            }
        }

        Self::email_only(
            email,
            &recipient.email,
            &recipient.full_name(),
            subject,
            message.to_string(),
            summary,
        )
        .await;
    }

    async fn email_only(
        email: &EmailService,
        to_email: &str,
        to_name: &str,
        subject: &str,
        message: String,
        summary: &mut DispatchSummary,
    ) {
        match email
            .send_notification(to_email, to_name, subject, &message)
            .await
        {
            Ok(()) => summary.emails += 1,
            Err(e) => {
                warn!(recipient.email = %to_email, error = %e.error, "Failed to send notification email");
                summary.failures += 1;
            }
        }
    }

    async fn insert_notification(
        db: &PgPool,
        recipient_id: Uuid,
        subject: &str,
        message: &str,
        course_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notifications (recipient_id, subject, message, course_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(recipient_id)
        .bind(subject)
        .bind(message)
        .bind(course_id)
        .execute(db)
        .await
        .map_err(AppError::from)?;

        debug!(recipient.id = %recipient_id, "Notification persisted");

        Ok(())
    }

    async fn fetch_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, role, department_id, phone, education_level, profession, is_active, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    async fn fetch_active_by_roles(
        db: &PgPool,
        roles: &[UserRole],
    ) -> Result<Vec<User>, AppError> {
        let role_names: Vec<String> = roles.iter().map(|r| r.to_string()).collect();

        sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, role, department_id, phone, education_level, profession, is_active, created_at, updated_at
             FROM users
             WHERE is_active = TRUE AND role = ANY($1::user_role[])
             ORDER BY created_at",
        )
        .bind(&role_names)
        .fetch_all(db)
        .await
        .map_err(AppError::from)
    }

    async fn fetch_course_team(db: &PgPool, course_id: Uuid) -> Result<Vec<TeamMember>, AppError> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT tm.id, tm.full_name, tm.qualification, tm.email
             FROM team_members tm
             INNER JOIN course_team ct ON ct.team_member_id = tm.id
             WHERE ct.course_id = $1",
        )
        .bind(course_id)
        .fetch_all(db)
        .await
        .map_err(AppError::from)
    }

    async fn fetch_linked_parents(db: &PgPool, child_id: Uuid) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.role, u.department_id, u.phone, u.education_level, u.profession, u.is_active, u.created_at, u.updated_at
             FROM users u
             INNER JOIN parent_child_relationships pcr ON pcr.parent_id = u.id
             WHERE pcr.child_id = $1 AND u.is_active = TRUE",
        )
        .bind(child_id)
        .fetch_all(db)
        .await
        .map_err(AppError::from)
    }

    async fn fetch_unlinked_parents(db: &PgPool) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, first_name, last_name, email, role, department_id, phone, education_level, profession, is_active, created_at, updated_at
             FROM users u
             WHERE role = 'parent' AND is_active = TRUE
               AND NOT EXISTS (
                   SELECT 1 FROM parent_child_relationships pcr WHERE pcr.parent_id = u.id
               )",
        )
        .fetch_all(db)
        .await
        .map_err(AppError::from)
    }
}
