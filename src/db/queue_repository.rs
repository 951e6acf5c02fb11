use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::{NewQueueEntry, PendingNotificationRow};
use crate::domain::QueueStatus;

/// Repository for the screening notification outbox.
pub struct QueueRepository;

impl QueueRepository {
    /// Queue (or re-queue) a screening email for an application. The
    /// (application_id, notification_type) key makes re-screening overwrite
    /// the previous entry instead of queueing a second email.
    pub async fn upsert(
        pool: &Pool<Postgres>,
        entry: &NewQueueEntry,
    ) -> Result<(), sqlx::Error> {
        debug!(
            "Queueing {} notification for application {}",
            entry.notification_type, entry.application_id
        );

        sqlx::query(
            r#"
            INSERT INTO screening_notification_queue
                (application_id, notification_type, passed_screening,
                 screening_score, job_title, company_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            ON CONFLICT (application_id, notification_type)
            DO UPDATE SET passed_screening = EXCLUDED.passed_screening,
                          screening_score = EXCLUDED.screening_score,
                          job_title = EXCLUDED.job_title,
                          company_name = EXCLUDED.company_name,
                          status = 'pending',
                          error_message = NULL,
                          updated_at = NOW()
            "#,
        )
        .bind(entry.application_id)
        .bind(entry.notification_type.as_str())
        .bind(entry.passed_screening)
        .bind(entry.screening_score)
        .bind(&entry.job_title)
        .bind(&entry.company_name)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Pending outbox rows joined with the applicant they should reach,
    /// oldest first. Failed rows are not picked up again.
    pub async fn pending(
        pool: &Pool<Postgres>,
        limit: i64,
    ) -> Result<Vec<PendingNotificationRow>, sqlx::Error> {
        sqlx::query_as::<_, PendingNotificationRow>(
            r#"
            SELECT q.id, q.application_id, q.notification_type,
                   q.passed_screening, q.screening_score, q.job_title,
                   q.company_name, a.applicant_id,
                   u.email AS applicant_email, u.full_name AS applicant_name
            FROM screening_notification_queue q
            JOIN job_applications a ON a.id = q.application_id
            JOIN users u ON u.id = a.applicant_id
            WHERE q.status = $1
            ORDER BY q.created_at ASC
            LIMIT $2
            "#,
        )
        .bind(QueueStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_sent(pool: &Pool<Postgres>, entry_id: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE screening_notification_queue
             SET status = $2, error_message = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(entry_id)
        .bind(QueueStatus::Sent.as_str())
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(
        pool: &Pool<Postgres>,
        entry_id: i32,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE screening_notification_queue
             SET status = $2, error_message = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(entry_id)
        .bind(QueueStatus::Failed.as_str())
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }
}
