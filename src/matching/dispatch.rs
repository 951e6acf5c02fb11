use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::{debug, info, warn};

use crate::db::job_repository::JobRepository;
use crate::db::models::JobPostingRow;
use crate::db::user_repository::UserRepository;
use crate::db::notification_repository::NotificationRepository;
use crate::error::{AppError, AppResult};
use crate::mailer::Mailer;
use crate::matching::engine::{ApplicantMatch, JobMatch, MatchingEngine};

/// Matches listed individually in the preference summary email; the rest are
/// only counted.
const SUMMARY_LIMIT: usize = 5;

/// Aggregate result of matching one new (or due) job against all candidates.
#[derive(Debug, Clone, Serialize)]
pub struct JobMatchingSummary {
    pub job_id: i32,
    pub total_matches: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub skipped_duplicates: usize,
}

/// Aggregate result of matching one user's preference against open jobs.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceMatchingSummary {
    pub user_id: i32,
    pub preference_id: i32,
    pub total_matches: usize,
    pub new_notifications: usize,
    pub skipped_duplicates: usize,
    pub email_sent: bool,
}

/// Turns matching results into notifications and outgoing email.
pub struct MatchingService {
    pool: Pool<Postgres>,
    engine: MatchingEngine,
    mailer: Arc<dyn Mailer>,
}

impl MatchingService {
    pub fn new(pool: Pool<Postgres>, mailer: Arc<dyn Mailer>) -> Self {
        let engine = MatchingEngine::new(pool.clone());
        Self {
            pool,
            engine,
            mailer,
        }
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    /// Notify every matching applicant about a job. Runs right after a job
    /// is posted and again when the job reaches its due date; the store-side
    /// uniqueness on job-match notifications makes the second run skip
    /// everyone already notified. Email failures are counted, never fatal.
    pub async fn process_new_job_matching(&self, job_id: i32) -> AppResult<JobMatchingSummary> {
        let job = JobRepository::fetch(&self.pool, job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job posting {job_id}")))?;

        let matches = self.engine.find_matching_applicants(&job).await?;
        let mut summary = JobMatchingSummary {
            job_id,
            total_matches: matches.len(),
            notifications_sent: 0,
            notifications_failed: 0,
            skipped_duplicates: 0,
        };

        for applicant in &matches {
            let (title, message) = job_match_notification(&job, applicant.match_score);

            let inserted = NotificationRepository::insert_job_match(
                &self.pool,
                applicant.user_id,
                job.id,
                &title,
                &message,
            )
            .await?;

            if !inserted {
                debug!(
                    "User {} already notified about job {}, skipping",
                    applicant.user_id, job.id
                );
                summary.skipped_duplicates += 1;
                continue;
            }

            let (subject, html) = job_match_email(&job, applicant);
            match self.mailer.send(&applicant.email, &subject, &html).await {
                Ok(()) => summary.notifications_sent += 1,
                Err(e) => {
                    // The in-app notification stands; only the email failed.
                    warn!("Job match email to {} failed: {}", applicant.email, e);
                    summary.notifications_failed += 1;
                }
            }
        }

        info!(
            "Job {} matching: {} matches, {} notified, {} failed, {} duplicates",
            job_id,
            summary.total_matches,
            summary.notifications_sent,
            summary.notifications_failed,
            summary.skipped_duplicates
        );
        Ok(summary)
    }

    /// Notify a user about jobs compatible with their (first) preference.
    /// Already-notified jobs are skipped via the store-side uniqueness, so
    /// repeated runs for an unchanged preference create nothing new. One
    /// summary email covers all new matches.
    pub async fn process_new_preference_matching(
        &self,
        user_id: i32,
        preference_id: i32,
    ) -> AppResult<PreferenceMatchingSummary> {
        let user = UserRepository::fetch(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        let matches = self.engine.find_matching_jobs_for_user(user_id).await?;
        let mut summary = PreferenceMatchingSummary {
            user_id,
            preference_id,
            total_matches: matches.len(),
            new_notifications: 0,
            skipped_duplicates: 0,
            email_sent: false,
        };

        let mut new_matches: Vec<&JobMatch> = Vec::new();
        for job_match in &matches {
            let (title, message) = preference_match_notification(job_match);

            let inserted = NotificationRepository::insert_job_match(
                &self.pool,
                user_id,
                job_match.job_id,
                &title,
                &message,
            )
            .await?;

            if inserted {
                summary.new_notifications += 1;
                new_matches.push(job_match);
            } else {
                summary.skipped_duplicates += 1;
            }
        }

        if !new_matches.is_empty() {
            let (subject, html) = match_summary_email(&user.full_name, &new_matches);
            match self.mailer.send(&user.email, &subject, &html).await {
                Ok(()) => summary.email_sent = true,
                Err(e) => warn!("Match summary email to {} failed: {}", user.email, e),
            }
        }

        info!(
            "Preference matching for user {} (preference {}): {} matches, {} new, {} duplicates",
            user_id,
            preference_id,
            summary.total_matches,
            summary.new_notifications,
            summary.skipped_duplicates
        );
        Ok(summary)
    }
}

fn job_match_notification(job: &JobPostingRow, match_score: i32) -> (String, String) {
    (
        "New job match".to_string(),
        format!(
            "{} at {} is a {}% match for your preferences.",
            job.title, job.company_name, match_score
        ),
    )
}

fn preference_match_notification(job_match: &JobMatch) -> (String, String) {
    (
        "New job match".to_string(),
        format!(
            "{} at {} is a {}% match for your preferences.",
            job_match.title, job_match.company_name, job_match.match_score
        ),
    )
}

fn job_match_email(job: &JobPostingRow, applicant: &ApplicantMatch) -> (String, String) {
    let subject = format!("Job match: {} at {}", job.title, job.company_name);
    let html = format!(
        "<p>Hi {},</p>\
         <p><strong>{}</strong> at <strong>{}</strong> ({}) matches your job \
         preferences with a score of <strong>{}%</strong>.</p>\
         <p>Log in to view the posting and apply before {}.</p>",
        applicant.full_name,
        job.title,
        job.company_name,
        job.location,
        applicant.match_score,
        job.due_date
    );
    (subject, html)
}

/// Summary email listing the top new matches; anything beyond the first
/// `SUMMARY_LIMIT` is folded into a remainder count.
fn match_summary_email(full_name: &str, matches: &[&JobMatch]) -> (String, String) {
    let subject = format!(
        "{} new job match{} for you",
        matches.len(),
        if matches.len() == 1 { "" } else { "es" }
    );

    let mut html = format!("<p>Hi {},</p><p>New jobs matching your preferences:</p><ul>", full_name);
    for job_match in matches.iter().take(SUMMARY_LIMIT) {
        let _ = write!(
            html,
            "<li><strong>{}</strong> at {} ({}) &mdash; {}% match</li>",
            job_match.title, job_match.company_name, job_match.location, job_match.match_score
        );
    }
    html.push_str("</ul>");

    if matches.len() > SUMMARY_LIMIT {
        let _ = write!(html, "<p>...and {} more.</p>", matches.len() - SUMMARY_LIMIT);
    }

    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::engine::MatchDetails;

    fn job_match(id: i32, title: &str, score: i32) -> JobMatch {
        JobMatch {
            job_id: id,
            title: title.to_string(),
            company_name: "Acme".to_string(),
            location: "Austin".to_string(),
            salary: Some(100_000.0),
            match_score: score,
            details: MatchDetails {
                category_match: true,
                position_type_match: true,
                location_match: true,
                salary_match: true,
            },
        }
    }

    #[test]
    fn summary_email_caps_listed_matches_at_five() {
        let matches: Vec<JobMatch> = (1..=7)
            .map(|i| job_match(i, &format!("Role {i}"), 100 - i))
            .collect();
        let refs: Vec<&JobMatch> = matches.iter().collect();

        let (subject, html) = match_summary_email("Sam", &refs);
        assert_eq!(subject, "7 new job matches for you");
        assert!(html.contains("Role 5"));
        assert!(!html.contains("Role 6"));
        assert!(html.contains("...and 2 more."));
    }

    #[test]
    fn summary_email_singular_subject() {
        let matches = [job_match(1, "Role 1", 88)];
        let refs: Vec<&JobMatch> = matches.iter().collect();

        let (subject, html) = match_summary_email("Sam", &refs);
        assert_eq!(subject, "1 new job match for you");
        assert!(html.contains("Role 1"));
        assert!(!html.contains("more."));
    }

    #[test]
    fn notification_message_names_job_and_score() {
        let (title, message) = preference_match_notification(&job_match(3, "Data Engineer", 75));
        assert_eq!(title, "New job match");
        assert!(message.contains("Data Engineer"));
        assert!(message.contains("75%"));
    }
}
