use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::matching::matcher::{EqualityAttributeTransactionMatcher, TransactionMatcher};
use crate::matching::result::MatchResult;
use crate::matching::selectors;
use crate::models::GeneralizedTransaction;

/// Runs matchers in order, each one over what the previous ones left unmatched.
#[derive(Default)]
pub struct WaterfallMatcher {
    stages: Vec<Box<dyn TransactionMatcher>>
}

impl WaterfallMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, stage: impl TransactionMatcher + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Reconciles `upstream` against `stored` from scratch.
    pub fn reconcile<U, S>(&self, upstream: U, stored: S) -> MatchResult
    where
        U: IntoIterator,
        U::Item: Into<GeneralizedTransaction>,
        S: IntoIterator,
        S::Item: Into<GeneralizedTransaction>
    {
        self.match_transactions(MatchResult::new(upstream, stored))
    }
}

impl TransactionMatcher for WaterfallMatcher {
    fn name(&self) -> &str {
        "waterfall"
    }

    fn match_transactions(&self, result: MatchResult) -> MatchResult {
        self.stages.iter().fold(result, |result, stage| {
            if result.is_fully_matched() {
                debug!("Skipping matcher [{}], nothing left to match", stage.name());
                return result;
            }

            stage.match_transactions(result)
        })
    }
}

impl fmt::Debug for WaterfallMatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("WaterfallMatcher").field("stages", &self.stage_names()).finish()
    }
}

/// The standard chain: external ids first, then attributes with
/// counterparty ids and finally description relaxed.
///
/// With a `timestamp_cutover` the attribute stages also key on the
/// transaction timestamp, treated as absent for transactions dated before it.
pub fn default_chain(timestamp_cutover: Option<NaiveDate>) -> WaterfallMatcher {
    let by_external_id = EqualityAttributeTransactionMatcher::new("external-id")
        .with_selector(selectors::external_id())
        .with_selector(selectors::amount_in_cents())
        .with_selector(selectors::date());

    let mut by_attributes = EqualityAttributeTransactionMatcher::new("attributes")
        .with_selector(selectors::amount_in_cents())
        .with_selector(selectors::date())
        .with_selector(selectors::description())
        .with_selector(selectors::counterparty_ids());

    if let Some(cutover) = timestamp_cutover {
        by_attributes = by_attributes.with_selector(selectors::timestamp().disabled_before(cutover));
    }

    let relaxed_counterparty = by_attributes.without_selector("relaxed-counterparty", selectors::COUNTERPARTY_IDS);
    let relaxed_description = relaxed_counterparty.without_selector("relaxed-description", selectors::DESCRIPTION);

    WaterfallMatcher::new()
        .then(by_external_id)
        .then(by_attributes)
        .then(relaxed_counterparty)
        .then(relaxed_description)
}
