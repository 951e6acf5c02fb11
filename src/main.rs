use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, filter::LevelFilter};

mod cli;
mod config;
mod db;
mod domain;
mod error;
mod events;
mod mailer;
mod matching;
mod screening;
mod shutdown;
mod worker;

use crate::cli::{Cli, Command};
use crate::events::{EventBus, EventDispatcher};
use crate::mailer::{LogMailer, Mailer};
use crate::matching::dispatch::MatchingService;
use crate::screening::workflow::ScreeningService;
use crate::shutdown::ShutdownCoordinator;
use crate::worker::scheduler::Scheduler;
use crate::worker::sweeps::{DueDateSweep, MatchSweep, NotificationSweep};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Cli::parse();

    // Load configuration from environment
    let config = config::Config::from_env().expect("Failed to load configuration");

    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(&config.log_dir).expect("Failed to create logs directory");

    // Initialize file-based logging with daily rotation and level separation
    // Log files will be created as: logs/info.2024-12-22.log, logs/error.2024-12-22.log, etc.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    // Create daily rotating file appenders for each log level
    let info_file = tracing_appender::rolling::daily(&config.log_dir, "info.log");
    let warn_file = tracing_appender::rolling::daily(&config.log_dir, "warn.log");
    let error_file = tracing_appender::rolling::daily(&config.log_dir, "error.log");
    let debug_file = tracing_appender::rolling::daily(&config.log_dir, "debug.log");

    // Create layers for each log level
    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    // Create console/stdout layer for terminal output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    // Initialize the subscriber with all layers (including console)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .with(debug_layer)
        .init();

    // Get database connection pool
    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .expect("Failed to connect to database");

    // Run migrations on startup
    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // One-shot commands run against the store and exit
    if let Some(command) = args.command {
        if !matches!(command, Command::Serve) {
            if let Err(e) = cli::run(command, pool.clone(), &config).await {
                eprintln!("Command failed: {e}");
                std::process::exit(1);
            }
            pool.close().await;
            return Ok(());
        }
    }

    info!("Starting talent-screener service");
    info!("Configuration loaded successfully:");
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Due-date sweep every {}s", config.due_sweep_interval_secs);
    info!("  - Match sweep every {}s", config.match_sweep_interval_secs);
    info!(
        "  - Notification sweep every {}s (batch {})",
        config.notification_sweep_interval_secs, config.notification_batch_size
    );

    // Shared services behind the email seam
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let screening = Arc::new(ScreeningService::new(pool.clone()));
    let matching = Arc::new(MatchingService::new(pool.clone(), mailer.clone()));

    // Create shutdown channel for graceful shutdown
    // watch channel allows multiple receivers to get the same value
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Event bus: the low-latency trigger path for job/preference/application
    // events; the outer platform publishes, the dispatcher consumes
    let (bus, events_rx) = EventBus::new();
    let dispatcher = EventDispatcher::new(screening.clone(), matching.clone());
    let dispatcher_handle = tokio::spawn(dispatcher.run(events_rx, shutdown_rx.clone()));

    // Register the periodic sweeps, one timer loop each
    let mut scheduler = Scheduler::new();
    scheduler.register(
        Duration::from_secs(config.due_sweep_interval_secs),
        Arc::new(DueDateSweep::new(pool.clone(), screening.clone(), matching.clone())),
    );
    scheduler.register(
        Duration::from_secs(config.match_sweep_interval_secs),
        Arc::new(MatchSweep::new(pool.clone(), matching.clone())),
    );
    scheduler.register(
        Duration::from_secs(config.notification_sweep_interval_secs),
        Arc::new(NotificationSweep::new(
            pool.clone(),
            mailer.clone(),
            config.notification_batch_size,
        )),
    );

    let mut task_handles = scheduler.start(shutdown_rx);
    task_handles.push(dispatcher_handle);
    info!("Scheduler started with {} background tasks", task_handles.len());

    // Keep the publishing half of the bus alive for the life of the process;
    // dropping it would close the channel and stop the dispatcher early
    let _bus = bus;

    // Create shutdown coordinator and wait for shutdown signal
    let coordinator = ShutdownCoordinator::new(task_handles, shutdown_tx, pool);
    coordinator.wait_for_shutdown().await
}
