use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::models::JobPostingRow;

const JOB_COLUMNS: &str = r#"
    j.id, j.hr_user_id, j.title, j.company_name, j.position_type,
    j.category_id, c.name AS category_name, j.location,
    j.min_education_level, j.min_experience, j.requirements, j.salary,
    j.post_date, j.due_date, j.is_active, j.screening_completed
"#;

/// Repository for job posting reads and the screening-completed flag.
pub struct JobRepository;

impl JobRepository {
    /// Fetch one job posting with its category name.
    pub async fn fetch(
        pool: &Pool<Postgres>,
        job_id: i32,
    ) -> Result<Option<JobPostingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {JOB_COLUMNS}
             FROM job_postings j
             LEFT JOIN categories c ON c.id = j.category_id
             WHERE j.id = $1"
        );

        sqlx::query_as::<_, JobPostingRow>(&sql)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Active postings still accepting applications (due date not reached).
    pub async fn active_open(pool: &Pool<Postgres>) -> Result<Vec<JobPostingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {JOB_COLUMNS}
             FROM job_postings j
             LEFT JOIN categories c ON c.id = j.category_id
             WHERE j.is_active AND j.due_date >= CURRENT_DATE
             ORDER BY j.post_date DESC"
        );

        sqlx::query_as::<_, JobPostingRow>(&sql).fetch_all(pool).await
    }

    /// Active postings whose application deadline is today.
    pub async fn due_today(pool: &Pool<Postgres>) -> Result<Vec<JobPostingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {JOB_COLUMNS}
             FROM job_postings j
             LEFT JOIN categories c ON c.id = j.category_id
             WHERE j.is_active AND j.due_date = CURRENT_DATE
             ORDER BY j.id"
        );

        sqlx::query_as::<_, JobPostingRow>(&sql).fetch_all(pool).await
    }

    /// Mark a job as fully screened once every pending application for it
    /// has been processed.
    pub async fn set_screening_completed(
        pool: &Pool<Postgres>,
        job_id: i32,
    ) -> Result<(), sqlx::Error> {
        debug!("Marking job {} screening_completed", job_id);

        sqlx::query("UPDATE job_postings SET screening_completed = TRUE WHERE id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
