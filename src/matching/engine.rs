use serde::Serialize;
use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::db::job_repository::JobRepository;
use crate::db::models::{JobPostingRow, JobPreferenceRow};
use crate::db::preference_repository::PreferenceRepository;
use crate::error::AppResult;

/// Matches scoring below this raw criteria total are discarded.
pub const MATCH_THRESHOLD: f64 = 2.0;

/// A job's salary within this fraction of the preferred minimum still earns
/// partial credit.
const SALARY_TOLERANCE: f64 = 0.9;

/// Per-criterion outcome reported alongside the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchDetails {
    pub category_match: bool,
    pub position_type_match: bool,
    pub location_match: bool,
    pub salary_match: bool,
}

/// Raw criteria score (0-4) plus the 0-100 rescaling reported to callers.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceScore {
    pub raw: f64,
    pub match_score: i32,
    pub details: MatchDetails,
}

/// A job recommended to a user.
#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    pub job_id: i32,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub salary: Option<f64>,
    pub match_score: i32,
    pub details: MatchDetails,
}

/// An applicant recommended for a job.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantMatch {
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
    pub match_score: i32,
    pub details: MatchDetails,
}

/// Compatibility between one job posting and one declared preference.
///
/// Four criteria on a 0-4 scale: category (equal ignoring case 1.0, else
/// 0.5), position type (exact 1.0), location (equal 1.0, substring overlap
/// either direction 0.5), salary (at least the preferred minimum 1.0, within
/// 90% of it 0.5). A missing salary on either side places no constraint.
pub fn score_preference(job: &JobPostingRow, preference: &JobPreferenceRow) -> PreferenceScore {
    let job_category = job.category_name.as_deref().unwrap_or("");
    let category_equal = !job_category.is_empty()
        && job_category.eq_ignore_ascii_case(preference.category.trim());
    let category_score = if category_equal { 1.0 } else { 0.5 };

    let position_equal = job.position_type == preference.position_type;
    let position_score = if position_equal { 1.0 } else { 0.0 };

    let location_score = location_score(&job.location, &preference.location);

    let salary_score = match (job.salary, preference.min_salary) {
        (Some(salary), Some(min_salary)) => {
            if salary >= min_salary {
                1.0
            } else if salary >= min_salary * SALARY_TOLERANCE {
                0.5
            } else {
                0.0
            }
        }
        // No figure on either side places no constraint.
        _ => 1.0,
    };

    let raw = category_score + position_score + location_score + salary_score;

    PreferenceScore {
        raw,
        match_score: (raw * 25.0).round() as i32,
        details: MatchDetails {
            category_match: category_equal,
            position_type_match: position_equal,
            location_match: location_score > 0.0,
            salary_match: salary_score > 0.0,
        },
    }
}

fn location_score(job_location: &str, preferred_location: &str) -> f64 {
    let job_loc = job_location.trim().to_lowercase();
    let pref_loc = preferred_location.trim().to_lowercase();

    if job_loc.is_empty() || pref_loc.is_empty() {
        0.0
    } else if job_loc == pref_loc {
        1.0
    } else if job_loc.contains(&pref_loc) || pref_loc.contains(&job_loc) {
        0.5
    } else {
        0.0
    }
}

/// Preference-driven compatibility queries, both directions.
pub struct MatchingEngine {
    pool: Pool<Postgres>,
}

impl MatchingEngine {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Applicants whose declared preference is compatible with this job:
    /// every active, verified user with a preference, scored and filtered at
    /// the threshold, best first.
    pub async fn find_matching_applicants(
        &self,
        job: &JobPostingRow,
    ) -> AppResult<Vec<ApplicantMatch>> {
        let candidates = PreferenceRepository::candidates(&self.pool).await?;
        debug!(
            "Scoring {} candidates against job {}",
            candidates.len(),
            job.id
        );

        let mut matches: Vec<ApplicantMatch> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let score = score_preference(job, &candidate.preference);
                (score.raw >= MATCH_THRESHOLD).then(|| ApplicantMatch {
                    user_id: candidate.user_id,
                    email: candidate.email,
                    full_name: candidate.full_name,
                    match_score: score.match_score,
                    details: score.details,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score).then(a.user_id.cmp(&b.user_id)));
        Ok(matches)
    }

    /// Jobs compatible with the user's first declared preference, drawn from
    /// active postings whose deadline has not passed. Returns nothing when
    /// the user holds no preference.
    pub async fn find_matching_jobs_for_user(&self, user_id: i32) -> AppResult<Vec<JobMatch>> {
        let Some(preference) = PreferenceRepository::first_for_user(&self.pool, user_id).await?
        else {
            debug!("User {} has no job preference, nothing to match", user_id);
            return Ok(Vec::new());
        };

        let jobs = JobRepository::active_open(&self.pool).await?;
        debug!("Scoring {} open jobs for user {}", jobs.len(), user_id);

        let mut matches: Vec<JobMatch> = jobs
            .into_iter()
            .filter_map(|job| {
                let score = score_preference(&job, &preference);
                (score.raw >= MATCH_THRESHOLD).then(|| JobMatch {
                    job_id: job.id,
                    title: job.title,
                    company_name: job.company_name,
                    location: job.location,
                    salary: job.salary,
                    match_score: score.match_score,
                    details: score.details,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score).then(a.job_id.cmp(&b.job_id)));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn job(
        category: &str,
        position_type: &str,
        location: &str,
        salary: Option<f64>,
    ) -> JobPostingRow {
        JobPostingRow {
            id: 1,
            hr_user_id: 10,
            title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            position_type: position_type.to_string(),
            category_id: Some(1),
            category_name: Some(category.to_string()),
            location: location.to_string(),
            min_education_level: "bachelor".to_string(),
            min_experience: 2.0,
            requirements: None,
            salary,
            post_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            is_active: true,
            screening_completed: false,
        }
    }

    fn preference(
        category: &str,
        position_type: &str,
        location: &str,
        min_salary: Option<f64>,
    ) -> JobPreferenceRow {
        JobPreferenceRow {
            id: 1,
            user_id: 2,
            category: category.to_string(),
            position_type: position_type.to_string(),
            location: location.to_string(),
            min_salary,
            keywords: None,
        }
    }

    #[test]
    fn partial_overlap_scenario() {
        // Category equal ignoring case (1.0), position type exact (1.0),
        // location substring overlap (0.5), salary within 90% of the
        // preferred minimum (0.5): raw 3.0, rescaled 75.
        let score = score_preference(
            &job("Engineering", "Full Time", "Austin", Some(90_000.0)),
            &preference("engineering", "Full Time", "Austin, TX", Some(95_000.0)),
        );

        assert!((score.raw - 3.0).abs() < f64::EPSILON);
        assert_eq!(score.match_score, 75);
        assert!(score.raw >= MATCH_THRESHOLD);
        assert_eq!(
            score.details,
            MatchDetails {
                category_match: true,
                position_type_match: true,
                location_match: true,
                salary_match: true,
            }
        );
    }

    #[test]
    fn full_match_scores_one_hundred() {
        let score = score_preference(
            &job("Engineering", "Full Time", "Austin", Some(100_000.0)),
            &preference("Engineering", "Full Time", "austin", Some(95_000.0)),
        );
        assert_eq!(score.match_score, 100);
    }

    #[test]
    fn category_mismatch_still_earns_half() {
        let score = score_preference(
            &job("Marketing", "Full Time", "Austin", Some(100_000.0)),
            &preference("Engineering", "Full Time", "Austin", Some(95_000.0)),
        );
        assert!((score.raw - 3.5).abs() < f64::EPSILON);
        assert!(!score.details.category_match);
    }

    #[test]
    fn position_type_must_match_exactly() {
        let score = score_preference(
            &job("Engineering", "Full Time", "Austin", Some(100_000.0)),
            &preference("Engineering", "Part Time", "Austin", Some(95_000.0)),
        );
        assert!(!score.details.position_type_match);
        assert!((score.raw - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn salary_bands() {
        let pref = preference("Engineering", "Full Time", "Remote", Some(100_000.0));
        let base = |salary| score_preference(&job("Engineering", "Full Time", "Remote", salary), &pref);

        assert!((base(Some(100_000.0)).raw - 4.0).abs() < f64::EPSILON);
        assert!((base(Some(95_000.0)).raw - 3.5).abs() < f64::EPSILON);
        assert!((base(Some(80_000.0)).raw - 3.0).abs() < f64::EPSILON);
        assert!(!base(Some(80_000.0)).details.salary_match);
        // No posted salary places no constraint.
        assert!((base(None).raw - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn below_threshold_is_excluded() {
        // Category half credit only: 0.5 + 0 + 0 + 0 = 0.5.
        let score = score_preference(
            &job("Marketing", "Contract", "Berlin", Some(50_000.0)),
            &preference("Engineering", "Full Time", "Austin", Some(95_000.0)),
        );
        assert!(score.raw < MATCH_THRESHOLD);
    }

    #[test]
    fn rescaling_rounds_to_integer() {
        // Raw 2.5 rescales to 62.5 and reports 63.
        let score = score_preference(
            &job("Engineering", "Full Time", "Berlin", Some(95_000.0)),
            &preference("engineering", "Full Time", "Austin", Some(100_000.0)),
        );
        assert!((score.raw - 2.5).abs() < f64::EPSILON);
        assert_eq!(score.match_score, 63);
    }
}
