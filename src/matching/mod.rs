//! Attribute-based reconciliation of provider transactions against stored ones.
//!
//! A matcher derives a composite key per transaction from an ordered list of
//! selectors, joins both sides on that key and classifies whatever is left.
//! Matchers are pure and are chained into a waterfall of progressively looser
//! selector sets by the caller.

mod attribute;
mod matcher;
mod result;
mod selector;
pub mod selectors;
mod waterfall;

pub use attribute::{Attribute, CounterpartyIds, IntoKeyPart, KeyPart, SelectorResult};
pub use matcher::{EqualityAttributeTransactionMatcher, TransactionMatcher};
pub use result::{MatchResult, MatchedPair, Unmatched, UnmatchedReason};
pub use selector::{AttributeSelector, KeySelector};
pub use waterfall::{default_chain, WaterfallMatcher};
