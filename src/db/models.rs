use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::domain::NotificationType;

/// Job posting joined with its category name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobPostingRow {
    pub id: i32,
    pub hr_user_id: i32,
    pub title: String,
    pub company_name: String,
    pub position_type: String,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub location: String,
    pub min_education_level: String,
    pub min_experience: f64,
    /// JSON array or comma-separated skill list, decoded tolerantly by the
    /// scoring engine.
    pub requirements: Option<String>,
    pub salary: Option<f64>,
    pub post_date: NaiveDate,
    pub due_date: NaiveDate,
    pub is_active: bool,
    pub screening_completed: bool,
}

/// Application joined with the screening-relevant fields of its job.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicationScreeningRow {
    pub id: i32,
    pub job_id: i32,
    pub applicant_id: i32,
    pub status: String,
    pub application_date: DateTime<Utc>,
    pub screening_score: Option<i32>,
    pub passed_screening: Option<bool>,
    pub screened_at: Option<DateTime<Utc>>,
    pub job_title: String,
    pub company_name: String,
    pub min_education_level: String,
    pub min_experience: f64,
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EducationRow {
    pub id: i32,
    pub user_id: i32,
    pub degree_level: String,
    pub field_of_study: String,
    pub institution: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkExperienceRow {
    pub id: i32,
    pub user_id: i32,
    pub job_title: String,
    pub company: String,
    pub industry: Option<String>,
    pub start_date: NaiveDate,
    /// None while `current_job` is set.
    pub end_date: Option<NaiveDate>,
    pub current_job: bool,
    pub responsibilities: Option<String>,
    /// JSON array or comma-separated skill list.
    pub skills: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobPreferenceRow {
    pub id: i32,
    pub user_id: i32,
    pub category: String,
    pub position_type: String,
    pub location: String,
    pub min_salary: Option<f64>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub is_verified: bool,
}

/// Active, verified user together with their first job preference.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
    #[sqlx(flatten)]
    pub preference: JobPreferenceRow,
}

/// Insert request for an in-app notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i32,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_id: Option<i32>,
}

/// Outbox row joined with the applicant it should reach.
#[derive(Debug, Clone, FromRow)]
pub struct PendingNotificationRow {
    pub id: i32,
    pub application_id: i32,
    pub notification_type: String,
    pub passed_screening: bool,
    pub screening_score: i32,
    pub job_title: String,
    pub company_name: String,
    pub applicant_id: i32,
    pub applicant_email: String,
    pub applicant_name: String,
}

/// Upsert request for the screening notification outbox; keyed by
/// (application_id, notification_type), so re-queueing overwrites.
#[derive(Debug, Clone)]
pub struct NewQueueEntry {
    pub application_id: i32,
    pub notification_type: NotificationType,
    pub passed_screening: bool,
    pub screening_score: i32,
    pub job_title: String,
    pub company_name: String,
}
