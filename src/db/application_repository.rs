use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::ApplicationScreeningRow;
use crate::domain::{ApplicationStatus, ScreeningUpdate};

/// Repository for job application reads and screening updates.
pub struct ApplicationRepository;

impl ApplicationRepository {
    /// Fetch an application joined with the screening-relevant fields of its
    /// job posting.
    pub async fn fetch_for_screening(
        pool: &Pool<Postgres>,
        application_id: i32,
    ) -> Result<Option<ApplicationScreeningRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationScreeningRow>(
            r#"
            SELECT a.id, a.job_id, a.applicant_id, a.status, a.application_date,
                   a.screening_score, a.passed_screening, a.screened_at,
                   j.title AS job_title, j.company_name,
                   j.min_education_level, j.min_experience, j.requirements
            FROM job_applications a
            JOIN job_postings j ON j.id = a.job_id
            WHERE a.id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(pool)
        .await
    }

    /// Identities of unscreened pending applications, oldest first.
    pub async fn pending_ids(
        pool: &Pool<Postgres>,
        limit: i64,
    ) -> Result<Vec<i32>, sqlx::Error> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM job_applications
            WHERE status = $1 AND screening_score IS NULL
            ORDER BY application_date ASC
            LIMIT $2
            "#,
        )
        .bind(ApplicationStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Unscreened pending applications for one job, oldest first.
    pub async fn pending_ids_for_job(
        pool: &Pool<Postgres>,
        job_id: i32,
    ) -> Result<Vec<i32>, sqlx::Error> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM job_applications
            WHERE job_id = $1 AND status = $2 AND screening_score IS NULL
            ORDER BY application_date ASC
            "#,
        )
        .bind(job_id)
        .bind(ApplicationStatus::Pending.as_str())
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Persist a screening decision onto an application.
    pub async fn apply_screening(
        pool: &Pool<Postgres>,
        application_id: i32,
        update: &ScreeningUpdate,
    ) -> Result<(), sqlx::Error> {
        debug!(
            "Applying screening update to application {}: score={} passed={} status={}",
            application_id, update.screening_score, update.passed_screening, update.status
        );

        sqlx::query(
            r#"
            UPDATE job_applications
            SET screening_score = $2, passed_screening = $3, status = $4, screened_at = $5
            WHERE id = $1
            "#,
        )
        .bind(application_id)
        .bind(update.screening_score)
        .bind(update.passed_screening)
        .bind(update.status.as_str())
        .bind(update.screened_at)
        .execute(pool)
        .await?;

        Ok(())
    }
}
