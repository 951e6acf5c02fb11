use thiserror::Error;

/// Application-level error taxonomy.
///
/// Batch operations never surface one of these for an individual item;
/// per-item failures are captured in the batch result so siblings keep going.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email delivery failed: {0}")]
    Email(String),
}

pub type AppResult<T> = Result<T, AppError>;
