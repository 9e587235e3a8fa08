use std::collections::HashMap;

use tracing::{debug, trace};

use crate::matching::attribute::{IntoKeyPart, KeyPart};
use crate::matching::result::{MatchResult, MatchedPair, Unmatched, UnmatchedReason};
use crate::matching::selector::{AttributeSelector, KeySelector};
use crate::models::GeneralizedTransaction;

type CompositeKey = Vec<KeyPart>;

/// One pure stage of a reconciliation: consumes a result, returns a refined one.
pub trait TransactionMatcher: Send + Sync {
    fn name(&self) -> &str;

    fn match_transactions(&self, result: MatchResult) -> MatchResult;
}

/// Pairs transactions whose composite keys are exactly equal.
///
/// Keys are built from the selectors in order. A key that occurs once on each
/// side yields a pair; any other shape leaves its transactions unmatched with
/// a reason describing why.
#[derive(Debug, Clone)]
pub struct EqualityAttributeTransactionMatcher {
    name: String,
    selectors: Vec<KeySelector>
}

impl EqualityAttributeTransactionMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selectors: Vec::new()
        }
    }

    pub fn with_selector<A: IntoKeyPart + 'static>(mut self, selector: AttributeSelector<A>) -> Self {
        self.selectors.push(selector.into_key_selector());
        self
    }

    pub fn selector_names(&self) -> Vec<&'static str> {
        self.selectors.iter().map(AttributeSelector::name).collect()
    }

    /// Returns a copy named `name` that no longer uses the selector called `selector_name`.
    pub fn without_selector(&self, name: impl Into<String>, selector_name: &str) -> Self {
        Self {
            name: name.into(),
            selectors: self.selectors.iter()
                .filter(|selector| selector.name() != selector_name)
                .cloned()
                .collect()
        }
    }

    fn composite_key(&self, transaction: &GeneralizedTransaction) -> Option<CompositeKey> {
        self.selectors.iter()
            .map(|selector| {
                let result = selector.select(transaction);

                if !result.usable {
                    trace!("Matcher [{}] rejected transaction on attribute [{}]", self.name, result.attribute.name);
                    return None;
                }

                Some(result.attribute.value.unwrap_or(KeyPart::Null))
            })
            .collect()
    }

    /// Splits entries into key groups and the entries rejected outright.
    fn group(&self, entries: Vec<Unmatched>) -> (HashMap<CompositeKey, Vec<Unmatched>>, Vec<Unmatched>) {
        let mut groups = HashMap::<CompositeKey, Vec<Unmatched>>::new();
        let mut rejected = Vec::new();

        for mut entry in entries {
            match self.composite_key(&entry.transaction) {
                Some(key) => groups.entry(key).or_default().push(entry),
                None => {
                    entry.escalate(UnmatchedReason::Rejected);
                    rejected.push(entry);
                }
            }
        }

        (groups, rejected)
    }
}

impl TransactionMatcher for EqualityAttributeTransactionMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_transactions(&self, result: MatchResult) -> MatchResult {
        let MatchResult { mut matched, unmatched_upstream, unmatched_stored } = result;
        let previously_matched = matched.len();

        let (upstream_groups, mut remaining_upstream) = self.group(unmatched_upstream);
        let (mut stored_groups, mut remaining_stored) = self.group(unmatched_stored);

        for (key, mut upstream_group) in upstream_groups {
            let Some(mut stored_group) = stored_groups.remove(&key) else {
                remaining_upstream.extend(classify(upstream_group, UnmatchedReason::Peerless));
                continue;
            };

            if upstream_group.len() == 1 && stored_group.len() == 1 {
                if let (Some(upstream), Some(stored)) = (upstream_group.pop(), stored_group.pop()) {
                    matched.push(MatchedPair::new(upstream, stored, &self.name));
                }
                continue;
            }

            let upstream_reason = ambiguity_reason(upstream_group.len());
            let stored_reason = ambiguity_reason(stored_group.len());
            remaining_upstream.extend(classify(upstream_group, upstream_reason));
            remaining_stored.extend(classify(stored_group, stored_reason));
        }

        for (_, stored_group) in stored_groups {
            remaining_stored.extend(classify(stored_group, UnmatchedReason::Peerless));
        }

        let mut result = MatchResult {
            matched,
            unmatched_upstream: remaining_upstream,
            unmatched_stored: remaining_stored
        };
        result.sort();

        debug!(
            "Matcher [{}] paired [{}] transactions, [{}] upstream and [{}] stored left unmatched",
            self.name,
            result.matched.len() - previously_matched,
            result.unmatched_upstream.len(),
            result.unmatched_stored.len()
        );

        result
    }
}

/// A group sharing a key with the other side: more than one member is
/// ambiguous, a lone member simply has no unambiguous peer.
fn ambiguity_reason(group_size: usize) -> UnmatchedReason {
    if group_size > 1 {
        UnmatchedReason::Duplicate
    } else {
        UnmatchedReason::Peerless
    }
}

fn classify(group: Vec<Unmatched>, reason: UnmatchedReason) -> Vec<Unmatched> {
    group.into_iter()
        .map(|mut entry| {
            entry.escalate(reason);
            entry
        })
        .collect()
}
