use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::enrichment::ActivityEnrichmentEvent;
use crate::tracker::errors::PublishError;

/// Outbound channel for terminal activity events.
#[async_trait]
pub trait ActivityEventPublisher: Send + Sync + 'static {
    async fn publish(&self, event: &ActivityEnrichmentEvent) -> Result<(), PublishError>;
}

/// Bounded exponential backoff for outbound calls.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5)
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }

    /// Runs `operation` until it succeeds, fails permanently or runs out of retries.
    pub async fn publish<F, Fut>(&self, operation_name: &str, operation: F) -> Result<(), PublishError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), PublishError>>
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(()) => {
                    if attempt > 0 {
                        info!("Operation [{operation_name}] succeeded after [{}] attempts", attempt + 1);
                    }
                    return Ok(());
                }
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    let backoff = self.backoff(attempt);
                    warn!("Operation [{operation_name}] failed, retrying in [{backoff:?}]: {error}");
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => return Err(error)
            }
        }
    }
}
