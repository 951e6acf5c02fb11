use sqlx::{Pool, Postgres};

use crate::db::models::UserRow;

/// Repository for the user fields the core reads (identity and contact).
pub struct UserRepository;

impl UserRepository {
    pub async fn fetch(
        pool: &Pool<Postgres>,
        user_id: i32,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, full_name, is_active, is_verified
             FROM users
             WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
