use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{Notification, NotificationFilterParams, PaginatedNotificationsResponse};

pub struct NotificationService;

impl NotificationService {
    /// A user's own notifications, newest first.
    #[instrument(skip(db, filters), fields(recipient.id = %recipient_id, db.operation = "SELECT", db.table = "notifications"))]
    pub async fn get_notifications(
        db: &PgPool,
        recipient_id: Uuid,
        filters: NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1",
        )
        .bind(recipient_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error counting notifications");
            AppError::from(e)
        })?;

        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT id, recipient_id, subject, message, course_id, is_read, sent_at
             FROM notifications
             WHERE recipient_id = $1
             ORDER BY sent_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching notifications");
            AppError::from(e)
        })?;

        debug!(total = %total, returned = %notifications.len(), "Notifications fetched");

        Ok(PaginatedNotificationsResponse {
            data: notifications,
            meta: PaginationMeta {
                total,
                limit,
                offset,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument(skip(db), fields(recipient.id = %recipient_id, db.operation = "SELECT", db.table = "notifications"))]
    pub async fn unread_count(db: &PgPool, recipient_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error counting unread notifications");
            AppError::from(e)
        })
    }

    /// Mark one of the caller's notifications as read. Another user's
    /// notification is a 403, a missing one a 404.
    #[instrument(skip(db), fields(notification.id = %notification_id, recipient.id = %recipient_id, db.operation = "UPDATE", db.table = "notifications"))]
    pub async fn mark_read(
        db: &PgPool,
        recipient_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            "SELECT id, recipient_id, subject, message, course_id, is_read, sent_at
             FROM notifications WHERE id = $1",
        )
        .bind(notification_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching notification");
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found")))?;

        if notification.recipient_id != recipient_id {
            return Err(AppError::forbidden(
                "You can only mark your own notifications as read",
            ));
        }

        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1
             RETURNING id, recipient_id, subject, message, course_id, is_read, sent_at",
        )
        .bind(notification_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error marking notification read");
            AppError::from(e)
        })?;

        debug!(notification.id = %notification_id, "Notification marked read");

        Ok(notification)
    }
}
