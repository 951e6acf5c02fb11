use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use validator::Validate;

use crate::db::application_repository::ApplicationRepository;
use crate::db::models::NewQueueEntry;
use crate::db::profile_repository::ProfileRepository;
use crate::db::queue_repository::QueueRepository;
use crate::domain::{ApplicationStatus, NotificationType, ScreeningUpdate};
use crate::error::{AppError, AppResult};
use crate::screening::scoring::{score_application, ScoreBreakdown};

/// Screenings run concurrently within a batch, bounded so one batch cannot
/// monopolize the connection pool.
const SCREENING_CONCURRENCY: usize = 4;

/// Batch size bounds enforced before any screening work begins.
#[derive(Debug, Validate)]
struct BatchRequest {
    #[validate(range(min = 1, max = 50, message = "batch size must be between 1 and 50"))]
    batch_size: u32,
}

/// Result record returned to HR/admin/applicant-facing layers.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutcome {
    pub application_id: i32,
    pub job_id: i32,
    pub applicant_id: i32,
    pub job_title: String,
    pub score: i32,
    pub education_score: i32,
    pub experience_score: i32,
    pub skills_score: i32,
    pub passed: bool,
    pub status: ApplicationStatus,
    pub screened_at: DateTime<Utc>,
    pub details: ScreeningDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningDetails {
    pub highest_education: Option<String>,
    pub total_experience_years: f64,
    pub required_experience_years: f64,
    pub required_education: String,
}

/// One entry of a batch screening run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub application_id: i32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

/// Orchestrates the scoring engine: fetch inputs, score, persist the
/// decision, queue the applicant-facing email.
pub struct ScreeningService {
    pool: Pool<Postgres>,
}

impl ScreeningService {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Screen one application end to end.
    ///
    /// Loads the application with its job's minimums, the applicant's
    /// education and work history, scores them, persists the decision
    /// (`UnderReview` on pass, `ScreenedOut` on fail) and queues the
    /// screening-result email in the outbox.
    pub async fn screen_application(&self, application_id: i32) -> AppResult<ScreeningOutcome> {
        let application = ApplicationRepository::fetch_for_screening(&self.pool, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("application {application_id}")))?;

        // Explicit re-screen requests can reach applications HR already
        // closed out; the overwrite is allowed but worth flagging.
        if let Some(status) = ApplicationStatus::parse(&application.status) {
            if status.is_terminal() {
                warn!(
                    "Re-screening application {} in terminal status {}",
                    application_id, status
                );
            }
        }

        let education = ProfileRepository::education(&self.pool, application.applicant_id).await?;
        let experience =
            ProfileRepository::work_experience(&self.pool, application.applicant_id).await?;

        let breakdown = score_application(
            &application.min_education_level,
            application.min_experience,
            application.requirements.as_deref(),
            &education,
            &experience,
            Utc::now().date_naive(),
        );

        let status = if breakdown.passed {
            ApplicationStatus::UnderReview
        } else {
            ApplicationStatus::ScreenedOut
        };
        let screened_at = Utc::now();

        let update = ScreeningUpdate {
            screening_score: breakdown.total_score,
            passed_screening: breakdown.passed,
            status,
            screened_at,
        };
        ApplicationRepository::apply_screening(&self.pool, application_id, &update).await?;

        // The email itself is delivered later by the notification sender;
        // the queue row is the durable record that one is owed.
        QueueRepository::upsert(
            &self.pool,
            &NewQueueEntry {
                application_id,
                notification_type: NotificationType::ScreeningResult,
                passed_screening: breakdown.passed,
                screening_score: breakdown.total_score,
                job_title: application.job_title.clone(),
                company_name: application.company_name.clone(),
            },
        )
        .await?;

        info!(
            "Screened application {}: score={} passed={} status={}",
            application_id, breakdown.total_score, breakdown.passed, status
        );

        Ok(build_outcome(&application, &breakdown, status, screened_at))
    }

    /// Identities of unscreened pending applications, oldest first.
    pub async fn pending_applications(&self, limit: i64) -> AppResult<Vec<i32>> {
        Ok(ApplicationRepository::pending_ids(&self.pool, limit).await?)
    }

    /// Screen up to `batch_size` pending applications with bounded fan-out.
    /// One application's failure is recorded on its item and never aborts
    /// the rest of the batch.
    pub async fn process_pending(&self, batch_size: u32) -> AppResult<BatchOutcome> {
        validate_batch_size(batch_size)?;

        let ids = ApplicationRepository::pending_ids(&self.pool, batch_size as i64).await?;
        info!("Processing {} pending screenings", ids.len());

        let results: Vec<BatchItem> = stream::iter(ids)
            .map(|id| async move {
                match self.screen_application(id).await {
                    Ok(outcome) => BatchItem {
                        application_id: id,
                        success: true,
                        score: Some(outcome.score),
                        passed: Some(outcome.passed),
                        error: None,
                    },
                    Err(e) => {
                        warn!("Screening failed for application {}: {}", id, e);
                        BatchItem {
                            application_id: id,
                            success: false,
                            score: None,
                            passed: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .buffer_unordered(SCREENING_CONCURRENCY)
            .collect()
            .await;

        let succeeded = results.iter().filter(|item| item.success).count();
        let outcome = BatchOutcome {
            processed: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            items: results,
        };

        info!(
            "Batch screening done: {} processed, {} succeeded, {} failed",
            outcome.processed, outcome.succeeded, outcome.failed
        );
        Ok(outcome)
    }
}

fn validate_batch_size(batch_size: u32) -> AppResult<()> {
    BatchRequest { batch_size }
        .validate()
        .map_err(|_| AppError::Validation("batch size must be between 1 and 50".to_string()))
}

fn build_outcome(
    application: &crate::db::models::ApplicationScreeningRow,
    breakdown: &ScoreBreakdown,
    status: ApplicationStatus,
    screened_at: DateTime<Utc>,
) -> ScreeningOutcome {
    ScreeningOutcome {
        application_id: application.id,
        job_id: application.job_id,
        applicant_id: application.applicant_id,
        job_title: application.job_title.clone(),
        score: breakdown.total_score,
        education_score: breakdown.education_score,
        experience_score: breakdown.experience_score,
        skills_score: breakdown.skills_score,
        passed: breakdown.passed,
        status,
        screened_at,
        details: ScreeningDetails {
            highest_education: breakdown.highest_education.map(|l| l.to_string()),
            total_experience_years: breakdown.total_experience_years,
            required_experience_years: application.min_experience,
            required_education: application.min_education_level.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_bounds() {
        assert!(validate_batch_size(0).is_err());
        assert!(validate_batch_size(1).is_ok());
        assert!(validate_batch_size(50).is_ok());
        assert!(validate_batch_size(51).is_err());
    }
}
