use crate::enrichment::ActivityEnrichment;
use crate::storage::{Retention, Storage};
use crate::types::ActivityId;
use chrono::{DateTime, Utc};
use dashmap::iter::Iter;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory activity store. Per-key atomicity comes from holding the
/// DashMap entry for the duration of a mutation.
#[derive(Default)]
pub struct ActivityStorage {
    records: Arc<DashMap<ActivityId, ActivityEnrichment>>
}

impl ActivityStorage {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new())
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, ActivityId, ActivityEnrichment> {
        self.records.iter()
    }
}

impl Storage for ActivityStorage {
    fn create(&self, enrichment: ActivityEnrichment) -> bool {
        match self.records.entry(enrichment.activity_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(enrichment);
                true
            }
        }
    }

    fn modify<R, F>(&self, activity_id: ActivityId, mutation: F) -> Option<R>
    where
        F: FnOnce(&mut ActivityEnrichment) -> (Retention, R)
    {
        match self.records.entry(activity_id) {
            Entry::Occupied(mut entry) => {
                let (retention, output) = mutation(entry.get_mut());

                if retention == Retention::Remove {
                    entry.remove();
                }

                Some(output)
            }
            Entry::Vacant(_) => None
        }
    }

    fn load(&self, activity_id: ActivityId) -> Option<ActivityEnrichment> {
        self.records.get(&activity_id).map(|enrichment| enrichment.value().clone())
    }

    fn started_before(&self, threshold: DateTime<Utc>) -> Vec<ActivityId> {
        self.records.iter()
            .filter(|enrichment| enrichment.started_at < threshold)
            .map(|enrichment| *enrichment.key())
            .collect()
    }
}
