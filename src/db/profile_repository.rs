use sqlx::{Pool, Postgres};

use crate::db::models::{EducationRow, WorkExperienceRow};

/// Repository for applicant profile history (education and work experience).
pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn education(
        pool: &Pool<Postgres>,
        user_id: i32,
    ) -> Result<Vec<EducationRow>, sqlx::Error> {
        sqlx::query_as::<_, EducationRow>(
            r#"
            SELECT id, user_id, degree_level, field_of_study, institution,
                   start_date, end_date, gpa
            FROM education_records
            WHERE user_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn work_experience(
        pool: &Pool<Postgres>,
        user_id: i32,
    ) -> Result<Vec<WorkExperienceRow>, sqlx::Error> {
        sqlx::query_as::<_, WorkExperienceRow>(
            r#"
            SELECT id, user_id, job_title, company, industry, start_date,
                   end_date, current_job, responsibilities, skills
            FROM work_experiences
            WHERE user_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
