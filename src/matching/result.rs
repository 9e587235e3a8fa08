use serde::Serialize;

use crate::models::GeneralizedTransaction;

/// Why a transaction is still unmatched, ordered by severity.
///
/// Reasons only ever escalate: a looser pass that would classify a
/// transaction less severely than a stricter earlier pass leaves the earlier
/// reason in place. `Peerless` is the top of the order, so a `Duplicate`
/// from an earlier pass becomes `Peerless` once a later pass finds its key
/// on one side only.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnmatchedReason {
    /// Not yet seen by any matcher.
    Unprocessed,
    /// A selector declared one of its attributes unusable.
    Rejected,
    /// Shares its composite key with another transaction on the same side.
    Duplicate,
    /// No transaction on the other side has the same composite key.
    Peerless
}

impl UnmatchedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unprocessed => "UNPROCESSED",
            Self::Rejected => "REJECTED",
            Self::Duplicate => "DUPLICATE",
            Self::Peerless => "PEERLESS"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unmatched {
    pub transaction: GeneralizedTransaction,
    pub reason: UnmatchedReason,
    position: usize
}

impl Unmatched {
    pub(crate) fn new(transaction: GeneralizedTransaction, position: usize) -> Self {
        Self {
            transaction,
            reason: UnmatchedReason::Unprocessed,
            position
        }
    }

    /// Position of the transaction in the collection it was supplied in.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Raises the reason to `reason` unless the current one is already at least as severe.
    pub fn escalate(&mut self, reason: UnmatchedReason) {
        self.reason = self.reason.max(reason);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub upstream: GeneralizedTransaction,
    pub stored: GeneralizedTransaction,
    /// Name of the matcher that paired the two.
    pub matched_by: String,
    upstream_position: usize
}

impl MatchedPair {
    pub(crate) fn new(upstream: Unmatched, stored: Unmatched, matched_by: &str) -> Self {
        Self {
            upstream_position: upstream.position,
            upstream: upstream.transaction,
            stored: stored.transaction,
            matched_by: matched_by.to_string()
        }
    }

    pub fn upstream_position(&self) -> usize {
        self.upstream_position
    }
}

/// State carried through a chain of matchers.
///
/// Matched pairs accumulate; each matcher only looks at what is still unmatched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub matched: Vec<MatchedPair>,
    pub unmatched_upstream: Vec<Unmatched>,
    pub unmatched_stored: Vec<Unmatched>
}

impl MatchResult {
    /// Seeds a result with every transaction unmatched and `UNPROCESSED`.
    pub fn new<U, S>(upstream: U, stored: S) -> Self
    where
        U: IntoIterator,
        U::Item: Into<GeneralizedTransaction>,
        S: IntoIterator,
        S::Item: Into<GeneralizedTransaction>
    {
        Self {
            matched: Vec::new(),
            unmatched_upstream: seed(upstream),
            unmatched_stored: seed(stored)
        }
    }

    pub fn is_fully_matched(&self) -> bool {
        self.unmatched_upstream.is_empty() && self.unmatched_stored.is_empty()
    }

    pub(crate) fn sort(&mut self) {
        self.matched.sort_by_key(MatchedPair::upstream_position);
        self.unmatched_upstream.sort_by_key(Unmatched::position);
        self.unmatched_stored.sort_by_key(Unmatched::position);
    }
}

fn seed<T>(transactions: T) -> Vec<Unmatched>
where
    T: IntoIterator,
    T::Item: Into<GeneralizedTransaction>
{
    transactions.into_iter()
        .enumerate()
        .map(|(position, transaction)| Unmatched::new(transaction.into(), position))
        .collect()
}
