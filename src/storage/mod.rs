mod activity_storage;

use chrono::{DateTime, Utc};

use crate::enrichment::ActivityEnrichment;
use crate::types::ActivityId;

pub use activity_storage::ActivityStorage;

/// What happens to a record once a mutation has run.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Retention {
    Keep,
    Remove
}

/// Persistence of in-flight activities, one record per activity id.
///
/// `modify` is the only way to change a record and must run the mutation and
/// its retention decision as one atomic step for that key. Operations on
/// different keys must not wait on each other.
pub trait Storage: Send + Sync + 'static {
    /// Inserts the record unless one already exists for its activity. Returns whether it was inserted.
    fn create(&self, enrichment: ActivityEnrichment) -> bool;

    /// Runs `mutation` against the stored record, or returns `None` when there is none.
    fn modify<R, F>(&self, activity_id: ActivityId, mutation: F) -> Option<R>
    where
        F: FnOnce(&mut ActivityEnrichment) -> (Retention, R);

    fn load(&self, activity_id: ActivityId) -> Option<ActivityEnrichment>;

    /// Ids of every activity started strictly before `threshold`.
    fn started_before(&self, threshold: DateTime<Utc>) -> Vec<ActivityId>;
}
