use sqlx::{Pool, Postgres};

use crate::db::models::{CandidateRow, JobPreferenceRow};

/// Repository for user job preferences and match candidates.
pub struct PreferenceRepository;

impl PreferenceRepository {
    /// The user's first preference. Matching uses only this one; multi
    /// preference aggregation is a recorded limitation.
    pub async fn first_for_user(
        pool: &Pool<Postgres>,
        user_id: i32,
    ) -> Result<Option<JobPreferenceRow>, sqlx::Error> {
        sqlx::query_as::<_, JobPreferenceRow>(
            r#"
            SELECT id, user_id, category, position_type, location, min_salary, keywords
            FROM job_preferences
            WHERE user_id = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Every active, verified user together with their first preference.
    /// These are the candidates evaluated by job matching and by the match
    /// sweep.
    pub async fn candidates(pool: &Pool<Postgres>) -> Result<Vec<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT DISTINCT ON (u.id)
                   p.user_id AS user_id, u.email, u.full_name,
                   p.id AS id, p.category, p.position_type, p.location,
                   p.min_salary, p.keywords
            FROM users u
            JOIN job_preferences p ON p.user_id = u.id
            WHERE u.is_active AND u.is_verified
            ORDER BY u.id, p.id ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
