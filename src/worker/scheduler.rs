use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::error::AppResult;

/// A unit of recurring work run by the scheduler.
#[async_trait]
pub trait ScheduledTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn run(&self) -> AppResult<()>;
}

/// Runs registered tasks on fixed intervals, one timer loop per task.
///
/// Each task gets its own spawned loop, so a slow or failing task never
/// delays or cancels its siblings. Errors are logged and the timer keeps
/// ticking. Tasks run once immediately at startup, then on their interval.
/// Lifecycle is owned by the caller via the shutdown watch channel.
pub struct Scheduler {
    tasks: Vec<(Duration, Arc<dyn ScheduledTask>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn register(&mut self, interval: Duration, task: Arc<dyn ScheduledTask>) {
        self.tasks.push((interval, task));
    }

    /// Spawn one loop per registered task. The returned handles complete
    /// once the shutdown signal fires.
    pub fn start(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|(interval, task)| {
                let mut shutdown_rx = shutdown_rx.clone();

                tokio::spawn(async move {
                    info!(
                        "Scheduled task '{}' started (every {:?})",
                        task.name(),
                        interval
                    );

                    let mut ticker = tokio::time::interval(interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                    loop {
                        tokio::select! {
                            _ = ticker.tick() => {
                                if let Err(e) = task.run().await {
                                    error!("Scheduled task '{}' failed: {}", task.name(), e);
                                }
                            }
                            changed = shutdown_rx.changed() => {
                                // A dropped sender counts as shutdown too
                                if changed.is_err() || *shutdown_rx.borrow() {
                                    info!("Scheduled task '{}' stopping", task.name());
                                    break;
                                }
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyTask {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl ScheduledTask for FlakyTask {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn run(&self) -> AppResult<()> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            if run % 2 == 0 {
                Err(AppError::Validation("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn task_errors_do_not_stop_the_timer() {
        let task = Arc::new(FlakyTask {
            runs: AtomicUsize::new(0),
        });

        let mut scheduler = Scheduler::new();
        scheduler.register(Duration::from_millis(10), task.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = scheduler.start(shutdown_rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        // First run errors; the loop must keep ticking past it.
        assert!(task.runs.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn shutdown_stops_all_task_loops() {
        let task_a = Arc::new(FlakyTask {
            runs: AtomicUsize::new(0),
        });
        let task_b = Arc::new(FlakyTask {
            runs: AtomicUsize::new(0),
        });

        let mut scheduler = Scheduler::new();
        scheduler.register(Duration::from_millis(5), task_a);
        scheduler.register(Duration::from_millis(5), task_b);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = scheduler.start(shutdown_rx);

        shutdown_tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
