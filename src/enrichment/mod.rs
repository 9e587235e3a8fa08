mod activity;
mod events;
mod message;

use serde::{Deserialize, Serialize};

pub use activity::{ActivityEnrichment, ActivityEnrichmentAccount};
pub use events::{ActivityEnrichmentEvent, EnrichmentStatus, OldestChangedDate};
pub use message::{AffectedTransaction, EnrichmentMessage, MessageKey};

pub type Checksum = u64;

/// An independent enrichment pipeline publishing paginated results per activity.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrichmentDomain {
    Categories,
    CounterParties,
    TransactionCycles,
    Labels,
    Preprocessing
}

impl EnrichmentDomain {
    pub const ALL: [EnrichmentDomain; 5] = [
        Self::Categories,
        Self::CounterParties,
        Self::TransactionCycles,
        Self::Labels,
        Self::Preprocessing
    ];

    /// Contribution of this domain's last page to an activity checksum.
    ///
    /// Each domain owns one decimal digit, so a checksum spells out how many
    /// last pages arrived per domain. As long as no domain is counted ten
    /// times, two different arrival histories can never add up to the same
    /// value.
    pub fn weight(&self) -> Checksum {
        match self {
            Self::Categories => 1,
            Self::CounterParties => 10,
            Self::TransactionCycles => 100,
            Self::Labels => 1_000,
            Self::Preprocessing => 10_000
        }
    }
}

/// Which enrichment pipelines are switched on for a client.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentCapabilities {
    pub categories: bool,
    pub counter_parties: bool,
    pub transaction_cycles: bool,
    pub labels: bool,
    pub preprocessing: bool
}

impl EnrichmentCapabilities {
    pub fn all() -> Self {
        Self {
            categories: true,
            counter_parties: true,
            transaction_cycles: true,
            labels: true,
            preprocessing: true
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn only(domains: &[EnrichmentDomain]) -> Self {
        domains.iter().fold(Self::none(), |capabilities, domain| capabilities.with(*domain))
    }

    pub fn with(mut self, domain: EnrichmentDomain) -> Self {
        *self.flag_mut(domain) = true;
        self
    }

    pub fn is_enabled(&self, domain: EnrichmentDomain) -> bool {
        match domain {
            EnrichmentDomain::Categories => self.categories,
            EnrichmentDomain::CounterParties => self.counter_parties,
            EnrichmentDomain::TransactionCycles => self.transaction_cycles,
            EnrichmentDomain::Labels => self.labels,
            EnrichmentDomain::Preprocessing => self.preprocessing
        }
    }

    pub fn any_enabled(&self) -> bool {
        EnrichmentDomain::ALL.iter().any(|domain| self.is_enabled(*domain))
    }

    pub fn enabled_domains(&self) -> impl Iterator<Item = EnrichmentDomain> + '_ {
        EnrichmentDomain::ALL.into_iter().filter(|domain| self.is_enabled(*domain))
    }

    fn flag_mut(&mut self, domain: EnrichmentDomain) -> &mut bool {
        match domain {
            EnrichmentDomain::Categories => &mut self.categories,
            EnrichmentDomain::CounterParties => &mut self.counter_parties,
            EnrichmentDomain::TransactionCycles => &mut self.transaction_cycles,
            EnrichmentDomain::Labels => &mut self.labels,
            EnrichmentDomain::Preprocessing => &mut self.preprocessing
        }
    }
}

/// The kind of work that triggered an activity.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityEnrichmentType {
    Refresh,
    CategoryFeedback,
    CounterpartyFeedback,
    TransactionCycleFeedback
}

impl ActivityEnrichmentType {
    /// Domains that report twice for this activity: a feedback correction is
    /// applied by its own pipeline right away and again by the full rerun it triggers.
    pub fn repeated_domains(&self) -> &'static [EnrichmentDomain] {
        match self {
            Self::Refresh => &[],
            Self::CategoryFeedback => &[EnrichmentDomain::Categories],
            Self::CounterpartyFeedback => &[EnrichmentDomain::CounterParties],
            Self::TransactionCycleFeedback => &[EnrichmentDomain::TransactionCycles]
        }
    }

    /// The checksum at which every expected last page has been observed.
    pub fn expected_checksum(&self, capabilities: &EnrichmentCapabilities) -> Checksum {
        let once: Checksum = capabilities.enabled_domains().map(|domain| domain.weight()).sum();
        let repeated: Checksum = self.repeated_domains().iter()
            .filter(|domain| capabilities.is_enabled(**domain))
            .map(EnrichmentDomain::weight)
            .sum();

        once + repeated
    }
}
