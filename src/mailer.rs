use async_trait::async_trait;
use tracing::info;

use crate::error::AppResult;

/// Outgoing email sink. Delivery itself lives outside this service; the
/// trait is the seam, carried as `Arc<dyn Mailer>` and swapped at startup.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

/// Default sink: logs the outgoing message instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        info!(
            "Email to {}: subject={:?} body_bytes={}",
            to,
            subject,
            html.len()
        );
        Ok(())
    }
}
