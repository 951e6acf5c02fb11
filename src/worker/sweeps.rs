use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};

use crate::db::application_repository::ApplicationRepository;
use crate::db::job_repository::JobRepository;
use crate::db::models::{NewNotification, PendingNotificationRow};
use crate::db::notification_repository::NotificationRepository;
use crate::db::preference_repository::PreferenceRepository;
use crate::db::queue_repository::QueueRepository;
use crate::domain::NotificationType;
use crate::error::AppResult;
use crate::mailer::Mailer;
use crate::matching::dispatch::MatchingService;
use crate::screening::workflow::ScreeningService;
use crate::worker::scheduler::ScheduledTask;

/// Daily sweep over jobs whose application deadline is today: screen every
/// pending application, mark the job fully screened, then re-run matching
/// for the job.
pub struct DueDateSweep {
    pool: Pool<Postgres>,
    screening: Arc<ScreeningService>,
    matching: Arc<MatchingService>,
}

impl DueDateSweep {
    pub fn new(
        pool: Pool<Postgres>,
        screening: Arc<ScreeningService>,
        matching: Arc<MatchingService>,
    ) -> Self {
        Self {
            pool,
            screening,
            matching,
        }
    }
}

#[async_trait]
impl ScheduledTask for DueDateSweep {
    fn name(&self) -> &'static str {
        "due_date_sweep"
    }

    async fn run(&self) -> AppResult<()> {
        let jobs = JobRepository::due_today(&self.pool).await?;
        if jobs.is_empty() {
            info!("Due-date sweep: no jobs due today");
            return Ok(());
        }
        info!("Due-date sweep: {} jobs due today", jobs.len());

        for job in jobs {
            let pending = ApplicationRepository::pending_ids_for_job(&self.pool, job.id).await?;
            let mut screened = 0usize;
            let mut failed = 0usize;

            for application_id in pending {
                match self.screening.screen_application(application_id).await {
                    Ok(_) => screened += 1,
                    Err(e) => {
                        // One bad application never halts the job's sweep.
                        warn!(
                            "Due-date screening failed for application {}: {}",
                            application_id, e
                        );
                        failed += 1;
                    }
                }
            }

            JobRepository::set_screening_completed(&self.pool, job.id).await?;

            if let Err(e) = self.matching.process_new_job_matching(job.id).await {
                warn!("Due-date matching failed for job {}: {}", job.id, e);
            }

            info!(
                "Due-date sweep for job {} '{}': {} screened, {} failed",
                job.id, job.title, screened, failed
            );
        }

        Ok(())
    }
}

/// Hourly sweep re-evaluating every candidate's preference against current
/// postings, catching jobs posted since the preference was last matched.
/// Safe to repeat: already-notified matches are skipped at the store.
pub struct MatchSweep {
    pool: Pool<Postgres>,
    matching: Arc<MatchingService>,
}

impl MatchSweep {
    pub fn new(pool: Pool<Postgres>, matching: Arc<MatchingService>) -> Self {
        Self { pool, matching }
    }
}

#[async_trait]
impl ScheduledTask for MatchSweep {
    fn name(&self) -> &'static str {
        "match_sweep"
    }

    async fn run(&self) -> AppResult<()> {
        let candidates = PreferenceRepository::candidates(&self.pool).await?;
        info!("Match sweep: evaluating {} candidates", candidates.len());

        let mut notified = 0usize;
        for candidate in candidates {
            match self
                .matching
                .process_new_preference_matching(candidate.user_id, candidate.preference.id)
                .await
            {
                Ok(summary) => notified += summary.new_notifications,
                Err(e) => {
                    warn!("Match sweep failed for user {}: {}", candidate.user_id, e);
                }
            }
        }

        info!("Match sweep done: {} new notifications", notified);
        Ok(())
    }
}

/// Daily drain of the screening notification outbox: send the applicant
/// facing email, write the in-app notification, mark the row sent. A failed
/// send marks the row failed with the error; failed rows are not retried by
/// later runs.
pub struct NotificationSweep {
    pool: Pool<Postgres>,
    mailer: Arc<dyn Mailer>,
    batch_size: i64,
}

impl NotificationSweep {
    pub fn new(pool: Pool<Postgres>, mailer: Arc<dyn Mailer>, batch_size: i64) -> Self {
        Self {
            pool,
            mailer,
            batch_size,
        }
    }
}

#[async_trait]
impl ScheduledTask for NotificationSweep {
    fn name(&self) -> &'static str {
        "notification_sweep"
    }

    async fn run(&self) -> AppResult<()> {
        let entries = QueueRepository::pending(&self.pool, self.batch_size).await?;
        if entries.is_empty() {
            info!("Notification sweep: outbox empty");
            return Ok(());
        }
        info!("Notification sweep: {} pending entries", entries.len());

        let mut sent = 0usize;
        let mut failed = 0usize;

        for entry in entries {
            let (subject, html) = screening_result_email(&entry);

            match self.mailer.send(&entry.applicant_email, &subject, &html).await {
                Ok(()) => {
                    let (title, message) = screening_result_notification(&entry);
                    NotificationRepository::insert(
                        &self.pool,
                        &NewNotification {
                            user_id: entry.applicant_id,
                            notification_type: NotificationType::ScreeningResult,
                            title,
                            message,
                            related_id: Some(entry.application_id),
                        },
                    )
                    .await?;
                    QueueRepository::mark_sent(&self.pool, entry.id).await?;
                    sent += 1;
                }
                Err(e) => {
                    warn!(
                        "Screening email for application {} failed: {}",
                        entry.application_id, e
                    );
                    QueueRepository::mark_failed(&self.pool, entry.id, &e.to_string()).await?;
                    failed += 1;
                }
            }
        }

        info!("Notification sweep done: {} sent, {} failed", sent, failed);
        Ok(())
    }
}

fn screening_result_notification(entry: &PendingNotificationRow) -> (String, String) {
    if entry.passed_screening {
        (
            "Application moving forward".to_string(),
            format!(
                "Your application for {} at {} passed screening with a score of {} and is now under review.",
                entry.job_title, entry.company_name, entry.screening_score
            ),
        )
    } else {
        (
            "Application update".to_string(),
            format!(
                "Your application for {} at {} did not pass the screening requirements.",
                entry.job_title, entry.company_name
            ),
        )
    }
}

fn screening_result_email(entry: &PendingNotificationRow) -> (String, String) {
    let subject = format!(
        "Your application to {} at {}",
        entry.job_title, entry.company_name
    );

    let html = if entry.passed_screening {
        format!(
            "<p>Hi {},</p>\
             <p>Good news: your application for <strong>{}</strong> at \
             <strong>{}</strong> passed the initial screening with a score of \
             <strong>{}</strong>. The hiring team is now reviewing it.</p>",
            entry.applicant_name, entry.job_title, entry.company_name, entry.screening_score
        )
    } else {
        format!(
            "<p>Hi {},</p>\
             <p>Thank you for applying for <strong>{}</strong> at \
             <strong>{}</strong>. After screening your profile against the \
             position's requirements we will not be moving forward with this \
             application.</p>",
            entry.applicant_name, entry.job_title, entry.company_name
        )
    };

    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(passed: bool, score: i32) -> PendingNotificationRow {
        PendingNotificationRow {
            id: 1,
            application_id: 42,
            notification_type: "screening_result".to_string(),
            passed_screening: passed,
            screening_score: score,
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            applicant_id: 7,
            applicant_email: "sam@example.com".to_string(),
            applicant_name: "Sam".to_string(),
        }
    }

    #[test]
    fn passed_email_includes_score() {
        let (subject, html) = screening_result_email(&entry(true, 88));
        assert!(subject.contains("Backend Engineer"));
        assert!(html.contains("88"));
        assert!(html.contains("passed"));
    }

    #[test]
    fn failed_email_omits_score() {
        let (_, html) = screening_result_email(&entry(false, 56));
        assert!(!html.contains("56"));
        assert!(html.contains("not be moving forward"));
    }

    #[test]
    fn notification_status_wording_follows_outcome() {
        let (title, message) = screening_result_notification(&entry(true, 80));
        assert_eq!(title, "Application moving forward");
        assert!(message.contains("under review"));

        let (title, message) = screening_result_notification(&entry(false, 40));
        assert_eq!(title, "Application update");
        assert!(message.contains("did not pass"));
    }
}
