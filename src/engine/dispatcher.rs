use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::actors::{ActivityLane, EnrichmentDelivery, LaneReport};
use crate::config::TrackerConfig;
use crate::storage::Storage;
use crate::tracker::ActivityEnrichmentService;
use crate::types::ActivityId;

/// Routes enrichment deliveries to a fixed set of lanes partitioned by activity id.
///
/// Every page of one activity lands on the same lane and is handled in order,
/// while different activities spread across lanes and proceed in parallel.
pub struct EnrichmentDispatcher<S: Storage> {
    service: Arc<ActivityEnrichmentService<S>>,
    lanes: usize,
    backpressure: usize
}

impl<S: Storage> EnrichmentDispatcher<S> {
    pub fn new(service: Arc<ActivityEnrichmentService<S>>, lanes: usize) -> Self {
        Self {
            service,
            lanes: lanes.max(1),
            backpressure: 256
        }
    }

    pub fn from_config(service: Arc<ActivityEnrichmentService<S>>, config: &TrackerConfig) -> Self {
        Self::new(service, config.lanes)
    }

    /// A bounded channel sized for this dispatcher, to feed into [`run`](Self::run).
    pub fn channel(&self) -> (mpsc::Sender<EnrichmentDelivery>, mpsc::Receiver<EnrichmentDelivery>) {
        mpsc::channel(self.backpressure)
    }

    pub fn partition(&self, activity_id: ActivityId) -> usize {
        (activity_id.as_u128() % self.lanes as u128) as usize
    }

    /// Consumes deliveries until every sender is dropped, then drains all lanes.
    pub async fn run(&self, mut receiver: mpsc::Receiver<EnrichmentDelivery>) -> LaneReport {
        let mut lanes = HashMap::<usize, ActivityLane>::new();

        while let Some(delivery) = receiver.recv().await {
            let partition = self.partition(delivery.message.activity_id);
            let activity_id = delivery.message.activity_id;
            let lane = lanes.entry(partition)
                .or_insert_with(|| ActivityLane::new(partition, self.service.clone()));

            if !lane.accept(delivery) {
                error!("Lane [{partition}] could not accept delivery for activity [{activity_id}]");
            }
        }

        info!("Delivery stream closed, draining [{}] lanes", lanes.len());

        let despawns = lanes.into_values().map(|lane| lane.despawn());

        join_all(despawns).await
            .into_iter()
            .fold(LaneReport::default(), |report, result| match result {
                Ok(lane_report) => report.merge(lane_report),
                Err(error) => {
                    error!("An activity lane did not despawn gracefully: {error:?}");
                    report
                }
            })
    }
}
