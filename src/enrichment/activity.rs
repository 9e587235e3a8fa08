use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::enrichment::{ActivityEnrichmentType, AffectedTransaction, Checksum, EnrichmentDomain};
use crate::types::{AccountId, ActivityId, UserId};

/// Oldest transaction date an activity has touched on one account.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ActivityEnrichmentAccount {
    pub activity_id: ActivityId,
    pub account_id: AccountId,
    pub oldest_touched_date: NaiveDate
}

impl ActivityEnrichmentAccount {
    /// Lowers the oldest date to `date` if it is older. Never raises it.
    pub fn touch(&mut self, date: NaiveDate) {
        self.oldest_touched_date = self.oldest_touched_date.min(date);
    }
}

/// Persisted progress of one in-flight activity.
///
/// The account set is owned by the record and only changes together with it,
/// under the storage's per-activity atomic update.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActivityEnrichment {
    pub activity_id: ActivityId,
    pub started_at: DateTime<Utc>,
    pub enrichment_type: ActivityEnrichmentType,
    pub user_id: UserId,
    pub checksum: Checksum,
    accounts: BTreeMap<AccountId, ActivityEnrichmentAccount>
}

impl ActivityEnrichment {
    pub fn new(activity_id: ActivityId, enrichment_type: ActivityEnrichmentType, user_id: UserId, started_at: DateTime<Utc>) -> Self {
        Self {
            activity_id,
            started_at,
            enrichment_type,
            user_id,
            checksum: 0,
            accounts: BTreeMap::new()
        }
    }

    /// Folds the dates of affected transactions into the per-account minimum.
    pub fn record_affected(&mut self, affected: &[AffectedTransaction]) {
        for transaction in affected {
            self.accounts.entry(transaction.account_id)
                .and_modify(|account| account.touch(transaction.date))
                .or_insert(ActivityEnrichmentAccount {
                    activity_id: self.activity_id,
                    account_id: transaction.account_id,
                    oldest_touched_date: transaction.date
                });
        }
    }

    pub fn record_last_page(&mut self, domain: EnrichmentDomain) {
        self.checksum = self.checksum.saturating_add(domain.weight());
    }

    pub fn accounts(&self) -> impl Iterator<Item = &ActivityEnrichmentAccount> {
        self.accounts.values()
    }

    pub fn oldest_touched_date(&self, account_id: AccountId) -> Option<NaiveDate> {
        self.accounts.get(&account_id).map(|account| account.oldest_touched_date)
    }
}
