mod activity_lane;

use crate::enrichment::{AffectedTransaction, EnrichmentMessage};
use crate::tracker::ClientContext;

pub use activity_lane::{ActivityLane, LaneReport};

/// One enrichment page as consumed from the bus, with the context needed to process it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentDelivery {
    pub message: EnrichmentMessage,
    pub affected: Vec<AffectedTransaction>,
    pub client: ClientContext
}
