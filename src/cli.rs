use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::{Pool, Postgres};

use crate::config::Config;
use crate::db::job_repository::JobRepository;
use crate::db::preference_repository::PreferenceRepository;
use crate::error::{AppError, AppResult};
use crate::mailer::{LogMailer, Mailer};
use crate::matching::dispatch::MatchingService;
use crate::screening::workflow::ScreeningService;
use crate::worker::scheduler::ScheduledTask;
use crate::worker::sweeps::{DueDateSweep, MatchSweep, NotificationSweep};

#[derive(Parser, Debug)]
#[command(name = "talent-screener", about = "Application screening and job matching service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduler service (default)
    Serve,

    /// Screen a single application now
    Screen {
        application_id: i32,
    },

    /// Screen a batch of pending applications, oldest first
    ScreenPending {
        /// Number of applications to process (1-50)
        #[arg(long, default_value_t = 20)]
        batch_size: u32,
    },

    /// List pending application ids awaiting screening
    Pending {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// Find matching applicants for a job and notify them
    MatchJob {
        job_id: i32,
    },

    /// Find matching jobs for a user and notify them
    MatchUser {
        user_id: i32,
    },

    /// List matching applicants for a job without notifying anyone
    FindApplicants {
        job_id: i32,
    },

    /// List matching jobs for a user without notifying them
    FindJobs {
        user_id: i32,
    },

    /// Run the due-date sweep once
    SweepDue,

    /// Run the preference match sweep once
    SweepMatches,

    /// Drain the screening notification outbox once
    SendNotifications,
}

/// Run a one-shot command against the store, printing the JSON outcome.
pub async fn run(command: Command, pool: Pool<Postgres>, config: &Config) -> AppResult<()> {
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let screening = Arc::new(ScreeningService::new(pool.clone()));
    let matching = Arc::new(MatchingService::new(pool.clone(), mailer.clone()));

    match command {
        Command::Serve => unreachable!("serve is handled by main"),

        Command::Screen { application_id } => {
            let outcome = screening.screen_application(application_id).await?;
            print_json(&outcome);
        }

        Command::ScreenPending { batch_size } => {
            let outcome = screening.process_pending(batch_size).await?;
            print_json(&outcome);
        }

        Command::Pending { limit } => {
            let ids = screening.pending_applications(limit).await?;
            print_json(&ids);
        }

        Command::MatchJob { job_id } => {
            let summary = matching.process_new_job_matching(job_id).await?;
            print_json(&summary);
        }

        Command::MatchUser { user_id } => {
            let preference_id = PreferenceRepository::first_for_user(&pool, user_id)
                .await?
                .map(|p| p.id)
                .unwrap_or_default();
            let summary = matching
                .process_new_preference_matching(user_id, preference_id)
                .await?;
            print_json(&summary);
        }

        Command::FindApplicants { job_id } => {
            let job = JobRepository::fetch(&pool, job_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("job posting {job_id}")))?;
            let matches = matching.engine().find_matching_applicants(&job).await?;
            print_json(&matches);
        }

        Command::FindJobs { user_id } => {
            let matches = matching.engine().find_matching_jobs_for_user(user_id).await?;
            print_json(&matches);
        }

        Command::SweepDue => {
            DueDateSweep::new(pool, screening, matching).run().await?;
        }

        Command::SweepMatches => {
            MatchSweep::new(pool, matching).run().await?;
        }

        Command::SendNotifications => {
            NotificationSweep::new(pool, mailer, config.notification_batch_size)
                .run()
                .await?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
