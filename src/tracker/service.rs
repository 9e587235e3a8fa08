use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::TrackerConfig;
use crate::enrichment::{ActivityEnrichment, ActivityEnrichmentEvent, ActivityEnrichmentType, AffectedTransaction, Checksum, EnrichmentMessage};
use crate::storage::{Retention, Storage};
use crate::tracker::clock::{Clock, SystemClock};
use crate::tracker::directory::UserDirectory;
use crate::tracker::publisher::{ActivityEventPublisher, RetryPolicy};
use crate::tracker::ClientContext;
use crate::types::ActivityId;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StartOutcome {
    Started,
    AlreadyStarted,
    /// The client has no enrichment pipeline enabled, so nothing will ever report back.
    NoCapabilities
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProcessOutcome {
    UnsupportedVersion,
    CapabilityDisabled,
    /// No started activity matches the message, it never started or already finished.
    Orphaned,
    Accumulating {
        checksum: Checksum,
        expected: Checksum
    },
    Completed
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SweepReport {
    /// Timed out with full user context.
    pub timed_out: usize,
    /// Timed out without user context because it could not be resolved.
    pub degraded: usize,
    /// Completed or removed elsewhere between selection and cleanup.
    pub already_gone: usize
}

impl SweepReport {
    pub fn merge(mut self, other: SweepReport) -> Self {
        self.timed_out += other.timed_out;
        self.degraded += other.degraded;
        self.already_gone += other.already_gone;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

enum Progress {
    Accumulating {
        checksum: Checksum,
        expected: Checksum
    },
    Completed(ActivityEnrichmentEvent)
}

enum TimeoutOutcome {
    TimedOut,
    Degraded,
    AlreadyGone
}

/// Decides when an activity has received every expected enrichment result.
///
/// Each relevant last page adds its domain's weight to the activity checksum;
/// the activity completes when the checksum equals the sum expected for its
/// type and the client's enabled pipelines. Activities that never get there
/// are swept once they exceed the timeout. Exactly one terminal event is
/// published per activity: whichever path removes the record publishes it.
pub struct ActivityEnrichmentService<S: Storage> {
    storage: Arc<S>,
    publisher: Arc<dyn ActivityEventPublisher>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    timeout: TimeDelta,
    retry: RetryPolicy
}

impl<S: Storage> ActivityEnrichmentService<S> {
    pub fn new(
        storage: Arc<S>,
        publisher: Arc<dyn ActivityEventPublisher>,
        users: Arc<dyn UserDirectory>,
        config: &TrackerConfig
    ) -> Self {
        Self {
            storage,
            publisher,
            users,
            clock: Arc::new(SystemClock),
            timeout: TimeDelta::from_std(config.timeout).unwrap_or_else(|_| TimeDelta::days(365)),
            retry: config.retry
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Registers an activity. Repeated starts for the same id are no-ops.
    pub fn start(&self, client: &ClientContext, activity_type: ActivityEnrichmentType, activity_id: ActivityId) -> StartOutcome {
        if !client.capabilities.any_enabled() {
            debug!("Activity [{activity_id}] not tracked, client [{}] has no enrichments enabled", client.client_id);
            return StartOutcome::NoCapabilities;
        }

        let enrichment = ActivityEnrichment::new(activity_id, activity_type, client.user_id, self.clock.now());

        if self.storage.create(enrichment) {
            info!("Activity [{activity_id}]:[{activity_type:?}] started for user [{}]", client.user_id);
            StartOutcome::Started
        } else {
            debug!("Activity [{activity_id}] already started");
            StartOutcome::AlreadyStarted
        }
    }

    /// Folds one enrichment page into its activity and completes the activity when it is the last one expected.
    pub async fn process_enrichment(
        &self,
        message: &EnrichmentMessage,
        affected: &[AffectedTransaction],
        client: &ClientContext
    ) -> ProcessOutcome {
        let activity_id = message.activity_id;

        if !message.is_supported_version() {
            warn!("Dropping [{:?}] message for activity [{activity_id}], unsupported version [{}]", message.domain, message.version);
            return ProcessOutcome::UnsupportedVersion;
        }

        if !client.capabilities.is_enabled(message.domain) {
            info!("Dropping [{:?}] message for activity [{activity_id}], capability disabled for client [{}]", message.domain, client.client_id);
            return ProcessOutcome::CapabilityDisabled;
        }

        let now = self.clock.now();
        let progress = self.storage.modify(activity_id, |enrichment| {
            enrichment.record_affected(affected);

            if message.is_last_page {
                enrichment.record_last_page(message.domain);
            }

            let expected = enrichment.enrichment_type.expected_checksum(&client.capabilities);

            if enrichment.checksum == expected {
                (Retention::Remove, Progress::Completed(ActivityEnrichmentEvent::completed(enrichment, client.client_id, now)))
            } else {
                (Retention::Keep, Progress::Accumulating { checksum: enrichment.checksum, expected })
            }
        });

        match progress {
            None => {
                warn!(
                    "Dropping [{:?}] page [{}/{}] for unknown activity [{activity_id}], not started or already finished",
                    message.domain,
                    message.message_index.saturating_add(1),
                    message.message_total
                );
                ProcessOutcome::Orphaned
            }
            Some(Progress::Accumulating { checksum, expected }) => {
                debug!("Activity [{activity_id}] at checksum [{checksum}] of [{expected}] after [{:?}] page", message.domain);
                ProcessOutcome::Accumulating { checksum, expected }
            }
            Some(Progress::Completed(event)) => {
                info!("Activity [{activity_id}] completed, [{}] accounts changed", event.accounts.len());
                self.publish(&event).await;
                ProcessOutcome::Completed
            }
        }
    }

    /// Times out every activity that started longer ago than the configured timeout.
    pub async fn sweep_timeouts(&self) -> SweepReport {
        let threshold = self.clock.now()
            .checked_sub_signed(self.timeout)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let stale = self.storage.started_before(threshold);

        if stale.is_empty() {
            return SweepReport::default();
        }

        debug!("Sweeping [{}] activities started before [{threshold}]", stale.len());

        let outcomes = join_all(stale.into_iter().map(|activity_id| self.time_out(activity_id, threshold))).await;

        outcomes.into_iter().fold(SweepReport::default(), |mut report, outcome| {
            match outcome {
                TimeoutOutcome::TimedOut => report.timed_out += 1,
                TimeoutOutcome::Degraded => report.degraded += 1,
                TimeoutOutcome::AlreadyGone => report.already_gone += 1
            }
            report
        })
    }

    async fn time_out(&self, activity_id: ActivityId, threshold: DateTime<Utc>) -> TimeoutOutcome {
        // Claim the record first so a concurrent completion and this timeout can never both publish.
        let claimed = self.storage.modify(activity_id, |enrichment| {
            if enrichment.started_at < threshold {
                (Retention::Remove, Some(enrichment.clone()))
            } else {
                (Retention::Keep, None)
            }
        });

        let Some(enrichment) = claimed.flatten() else {
            debug!("Activity [{activity_id}] finished before it could time out");
            return TimeoutOutcome::AlreadyGone;
        };

        let now = self.clock.now();
        let (event, outcome) = match self.users.find_user(enrichment.user_id).await {
            Ok(Some(user)) => (ActivityEnrichmentEvent::timed_out(&enrichment, user.client_id, now), TimeoutOutcome::TimedOut),
            Ok(None) => {
                warn!("User [{}] of timed out activity [{activity_id}] not found, publishing without details", enrichment.user_id);
                (ActivityEnrichmentEvent::timed_out_degraded(&enrichment, now), TimeoutOutcome::Degraded)
            }
            Err(error) => {
                warn!("User [{}] of timed out activity [{activity_id}] could not be resolved, publishing without details: {error}", enrichment.user_id);
                (ActivityEnrichmentEvent::timed_out_degraded(&enrichment, now), TimeoutOutcome::Degraded)
            }
        };

        warn!("Activity [{activity_id}] timed out at checksum [{}]", enrichment.checksum);
        self.publish(&event).await;

        outcome
    }

    async fn publish(&self, event: &ActivityEnrichmentEvent) {
        let operation = format!("publish {:?} event for activity {}", event.status, event.activity_id);

        if let Err(error) = self.retry.publish(&operation, || self.publisher.publish(event)).await {
            error!("Giving up on event for activity [{}]: {error}", event.activity_id);
        }
    }
}
