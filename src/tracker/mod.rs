//! Completion tracking for multi-pipeline enrichment activities.

mod clock;
mod directory;
mod errors;
mod publisher;
mod service;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use crate::enrichment::EnrichmentCapabilities;
use crate::types::{ClientId, UserId};

pub use clock::{Clock, SystemClock};
pub use directory::{CachedUserDirectory, UserContext, UserDirectory};
pub use errors::{DirectoryError, PublishError};
pub use publisher::{ActivityEventPublisher, RetryPolicy};
pub use service::{ActivityEnrichmentService, ProcessOutcome, StartOutcome, SweepReport};

/// The client and user an activity runs for, with the client's enabled pipelines.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ClientContext {
    pub client_id: ClientId,
    pub user_id: UserId,
    pub capabilities: EnrichmentCapabilities
}
