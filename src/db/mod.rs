pub mod application_repository;
pub mod connection;
pub mod job_repository;
pub mod migrations;
pub mod models;
pub mod notification_repository;
pub mod preference_repository;
pub mod profile_repository;
pub mod queue_repository;
pub mod user_repository;
