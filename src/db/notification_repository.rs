use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::NewNotification;
use crate::domain::NotificationType;

/// Repository for in-app notifications.
pub struct NotificationRepository;

impl NotificationRepository {
    /// Insert a notification, returning its id.
    pub async fn insert(
        pool: &Pool<Postgres>,
        notification: &NewNotification,
    ) -> Result<i32, sqlx::Error> {
        debug!(
            "Inserting {} notification for user {}",
            notification.notification_type, notification.user_id
        );

        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, related_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_id)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    /// Insert a job-match notification unless one already exists for this
    /// (user, job) pair. The partial unique index resolves the check-then
    /// -insert race at the store, so concurrent matching runs cannot
    /// duplicate it. Returns whether a row was inserted.
    pub async fn insert_job_match(
        pool: &Pool<Postgres>,
        user_id: i32,
        job_id: i32,
        title: &str,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, related_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, related_id) WHERE notification_type = 'job_match'
            DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(NotificationType::JobMatch.as_str())
        .bind(title)
        .bind(message)
        .bind(job_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
