use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Degree levels ordered from High School (1) up to PhD (6).
///
/// Profile rows store the level as free text; `parse` accepts the common
/// spellings and returns `None` for anything unrecognized so the scorer can
/// degrade instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    Associate,
    Diploma,
    Bachelor,
    Master,
    Phd,
}

impl EducationLevel {
    /// Ordinal rank used by the education sub-score.
    pub fn rank(self) -> i32 {
        match self {
            EducationLevel::HighSchool => 1,
            EducationLevel::Associate => 2,
            EducationLevel::Diploma => 3,
            EducationLevel::Bachelor => 4,
            EducationLevel::Master => 5,
            EducationLevel::Phd => 6,
        }
    }

    /// Tolerant parse of a stored degree-level string.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "highschool" | "secondary" => Some(EducationLevel::HighSchool),
            "associate" | "associates" => Some(EducationLevel::Associate),
            "diploma" => Some(EducationLevel::Diploma),
            "bachelor" | "bachelors" | "undergraduate" => Some(EducationLevel::Bachelor),
            "master" | "masters" | "graduate" => Some(EducationLevel::Master),
            "phd" | "doctorate" | "doctoral" => Some(EducationLevel::Phd),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::HighSchool => "high_school",
            EducationLevel::Associate => "associate",
            EducationLevel::Diploma => "diploma",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Phd => "phd",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a job application.
///
/// `Pending -> UnderReview | ScreenedOut` is owned by the screening workflow;
/// the transitions out of `UnderReview` belong to HR tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Interview,
    ScreenedOut,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::ScreenedOut => "screened_out",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pending" => Some(ApplicationStatus::Pending),
            "underreview" => Some(ApplicationStatus::UnderReview),
            "interview" => Some(ApplicationStatus::Interview),
            "screenedout" => Some(ApplicationStatus::ScreenedOut),
            "rejected" => Some(ApplicationStatus::Rejected),
            "accepted" => Some(ApplicationStatus::Accepted),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::ScreenedOut
                | ApplicationStatus::Rejected
                | ApplicationStatus::Accepted
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-app notification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    JobMatch,
    ScreeningResult,
    QualifiedApplicant,
    ApplicationUpdate,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::JobMatch => "job_match",
            NotificationType::ScreeningResult => "screening_result",
            NotificationType::QualifiedApplicant => "qualified_applicant",
            NotificationType::ApplicationUpdate => "application_update",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery state of a screening notification outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Sent,
    Failed,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Sent => "sent",
            QueueStatus::Failed => "failed",
        }
    }
}

/// Typed update applied to a job application once screening finishes.
/// Translated to SQL exactly once, in the application repository.
#[derive(Debug, Clone)]
pub struct ScreeningUpdate {
    pub screening_score: i32,
    pub passed_screening: bool,
    pub status: ApplicationStatus,
    pub screened_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn education_ranks_are_ordered() {
        let levels = [
            EducationLevel::HighSchool,
            EducationLevel::Associate,
            EducationLevel::Diploma,
            EducationLevel::Bachelor,
            EducationLevel::Master,
            EducationLevel::Phd,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
        assert_eq!(EducationLevel::HighSchool.rank(), 1);
        assert_eq!(EducationLevel::Phd.rank(), 6);
    }

    #[test]
    fn education_parse_accepts_common_spellings() {
        assert_eq!(
            EducationLevel::parse("High School"),
            Some(EducationLevel::HighSchool)
        );
        assert_eq!(
            EducationLevel::parse("high_school"),
            Some(EducationLevel::HighSchool)
        );
        assert_eq!(
            EducationLevel::parse("Bachelor's"),
            Some(EducationLevel::Bachelor)
        );
        assert_eq!(EducationLevel::parse("PhD"), Some(EducationLevel::Phd));
        assert_eq!(EducationLevel::parse("Doctorate"), Some(EducationLevel::Phd));
        assert_eq!(EducationLevel::parse("bootcamp"), None);
        assert_eq!(EducationLevel::parse(""), None);
    }

    #[test]
    fn status_parse_round_trips() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Interview,
            ApplicationStatus::ScreenedOut,
            ApplicationStatus::Rejected,
            ApplicationStatus::Accepted,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            ApplicationStatus::parse("Under Review"),
            Some(ApplicationStatus::UnderReview)
        );
        assert_eq!(ApplicationStatus::parse("archived"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(ApplicationStatus::ScreenedOut.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::Accepted.is_terminal());
        assert!(!ApplicationStatus::Pending.is_terminal());
        assert!(!ApplicationStatus::UnderReview.is_terminal());
        assert!(!ApplicationStatus::Interview.is_terminal());
    }
}
