use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::enrichment::ActivityEnrichment;
use crate::types::{AccountId, ActivityId, ClientId, UserId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrichmentStatus {
    Success,
    Timeout
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OldestChangedDate {
    pub account_id: AccountId,
    pub date: NaiveDate
}

/// Terminal notification for an activity: either every pipeline finished or it timed out.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEnrichmentEvent {
    pub user_id: UserId,
    /// Absent on a degraded timeout, when the user could not be resolved.
    pub client_id: Option<ClientId>,
    pub activity_id: ActivityId,
    pub accounts: Vec<OldestChangedDate>,
    pub at: DateTime<Utc>,
    pub status: EnrichmentStatus
}

impl ActivityEnrichmentEvent {
    pub fn completed(enrichment: &ActivityEnrichment, client_id: ClientId, at: DateTime<Utc>) -> Self {
        Self::detailed(enrichment, client_id, at, EnrichmentStatus::Success)
    }

    pub fn timed_out(enrichment: &ActivityEnrichment, client_id: ClientId, at: DateTime<Utc>) -> Self {
        Self::detailed(enrichment, client_id, at, EnrichmentStatus::Timeout)
    }

    /// A timeout event carrying nothing beyond the user and activity.
    pub fn timed_out_degraded(enrichment: &ActivityEnrichment, at: DateTime<Utc>) -> Self {
        Self {
            user_id: enrichment.user_id,
            client_id: None,
            activity_id: enrichment.activity_id,
            accounts: Vec::new(),
            at,
            status: EnrichmentStatus::Timeout
        }
    }

    fn detailed(enrichment: &ActivityEnrichment, client_id: ClientId, at: DateTime<Utc>, status: EnrichmentStatus) -> Self {
        Self {
            user_id: enrichment.user_id,
            client_id: Some(client_id),
            activity_id: enrichment.activity_id,
            accounts: enrichment.accounts()
                .map(|account| OldestChangedDate {
                    account_id: account.account_id,
                    date: account.oldest_touched_date
                })
                .collect(),
            at,
            status
        }
    }
}
