use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::matching::dispatch::MatchingService;
use crate::screening::workflow::ScreeningService;

/// Ad hoc triggers feeding the core: fire-and-observe, no return value.
/// These give job posting, preference changes and application submission a
/// low-latency path instead of waiting for the next scheduled sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    JobCreated { job_id: i32 },
    PreferenceUpdated { user_id: i32, preference_id: i32 },
    ApplicationSubmitted { application_id: i32 },
}

/// Publishing half of the bus. Constructed (not global) and handed to the
/// layers that produce events; lifecycle belongs to the process entry point.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            warn!("Event dropped: dispatcher is no longer running");
        }
    }
}

/// Consumes bus events and invokes the matching/screening services. Each
/// event is handled in isolation; a failing handler is logged and the loop
/// keeps draining.
pub struct EventDispatcher {
    screening: Arc<ScreeningService>,
    matching: Arc<MatchingService>,
}

impl EventDispatcher {
    pub fn new(screening: Arc<ScreeningService>, matching: Arc<MatchingService>) -> Self {
        Self {
            screening,
            matching,
        }
    }

    pub async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<AppEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("Event dispatcher started");

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // A dropped sender counts as shutdown too
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Event dispatcher shutting down");
                        break;
                    }
                }
                event = rx.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            info!("Event bus closed, dispatcher stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle(&self, event: AppEvent) {
        match event {
            AppEvent::JobCreated { job_id } => {
                if let Err(e) = self.matching.process_new_job_matching(job_id).await {
                    error!("Job matching for new job {} failed: {}", job_id, e);
                }
            }
            AppEvent::PreferenceUpdated {
                user_id,
                preference_id,
            } => {
                if let Err(e) = self
                    .matching
                    .process_new_preference_matching(user_id, preference_id)
                    .await
                {
                    error!(
                        "Preference matching for user {} (preference {}) failed: {}",
                        user_id, preference_id, e
                    );
                }
            }
            AppEvent::ApplicationSubmitted { application_id } => {
                if let Err(e) = self.screening.screen_application(application_id).await {
                    error!("Screening for application {} failed: {}", application_id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_delivers_in_order() {
        let (bus, mut rx) = EventBus::new();

        bus.publish(AppEvent::JobCreated { job_id: 1 });
        bus.publish(AppEvent::PreferenceUpdated {
            user_id: 2,
            preference_id: 3,
        });

        assert_eq!(rx.recv().await, Some(AppEvent::JobCreated { job_id: 1 }));
        assert_eq!(
            rx.recv().await,
            Some(AppEvent::PreferenceUpdated {
                user_id: 2,
                preference_id: 3
            })
        );
    }

    #[tokio::test]
    async fn publish_after_receiver_drop_does_not_panic() {
        let (bus, rx) = EventBus::new();
        drop(rx);
        bus.publish(AppEvent::ApplicationSubmitted { application_id: 9 });
    }
}
