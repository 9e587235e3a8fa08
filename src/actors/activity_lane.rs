use std::sync::Arc;

use tokio::spawn;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use crate::actors::EnrichmentDelivery;
use crate::storage::Storage;
use crate::tracker::{ActivityEnrichmentService, ProcessOutcome};

/// Tally of what a lane did with its deliveries.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LaneReport {
    pub processed: usize,
    pub completed: usize,
    pub dropped: usize
}

impl LaneReport {
    fn record(&mut self, outcome: ProcessOutcome) {
        self.processed += 1;

        match outcome {
            ProcessOutcome::Completed => self.completed += 1,
            ProcessOutcome::Accumulating { .. } => {}
            ProcessOutcome::UnsupportedVersion | ProcessOutcome::CapabilityDisabled | ProcessOutcome::Orphaned => self.dropped += 1
        }
    }

    pub fn merge(mut self, other: LaneReport) -> Self {
        self.processed += other.processed;
        self.completed += other.completed;
        self.dropped += other.dropped;
        self
    }
}

/// Serial worker for one partition of activities.
///
/// Deliveries accepted by a lane are processed strictly in arrival order.
pub struct ActivityLane {
    lane: usize,
    sender: mpsc::UnboundedSender<EnrichmentDelivery>,
    handle: JoinHandle<LaneReport>
}

impl ActivityLane {
    pub fn new<S: Storage>(lane: usize, service: Arc<ActivityEnrichmentService<S>>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<EnrichmentDelivery>();

        let handle = spawn(async move {
            let mut report = LaneReport::default();

            while let Some(delivery) = receiver.recv().await {
                let outcome = service
                    .process_enrichment(&delivery.message, &delivery.affected, &delivery.client)
                    .await;

                debug!("Lane [{lane}] processed [{:?}] page for activity [{}]: {outcome:?}", delivery.message.domain, delivery.message.activity_id);
                report.record(outcome);
            }

            report
        });

        Self { lane, sender, handle }
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Queues a delivery. Returns `false` when the lane has already stopped.
    pub fn accept(&self, delivery: EnrichmentDelivery) -> bool {
        self.sender.send(delivery).is_ok()
    }

    /// Closes the lane's queue and waits for everything already accepted to be processed.
    pub async fn despawn(self) -> Result<LaneReport, JoinError> {
        drop(self.sender);
        self.handle.await
    }
}
