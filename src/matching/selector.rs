use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::matching::attribute::{Attribute, IntoKeyPart, KeyPart, SelectorResult};
use crate::models::GeneralizedTransaction;

type Extractor<A> = dyn Fn(&GeneralizedTransaction) -> SelectorResult<A> + Send + Sync;

/// A selector whose value has been erased to a key component, ready for a matcher.
pub type KeySelector = AttributeSelector<KeyPart>;

/// Extracts one typed attribute from a transaction.
///
/// Selectors are plain closures. Cross-cutting rules are layered on with the
/// decorator methods (`reject_null`, `reject_blank`, `reject_placeholder`,
/// `disabled_before`), each of which wraps the previous extractor and returns
/// a new selector. A bare selector built with [`AttributeSelector::new`]
/// reports every value as usable, including an absent one.
pub struct AttributeSelector<A> {
    name: &'static str,
    extractor: Arc<Extractor<A>>
}

impl<A> Clone for AttributeSelector<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            extractor: Arc::clone(&self.extractor)
        }
    }
}

impl<A> fmt::Debug for AttributeSelector<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("AttributeSelector").field("name", &self.name).finish()
    }
}

impl<A: 'static> AttributeSelector<A> {
    pub fn new<F>(name: &'static str, extract: F) -> Self
    where
        F: Fn(&GeneralizedTransaction) -> Option<A> + Send + Sync + 'static
    {
        Self {
            name,
            extractor: Arc::new(move |transaction: &GeneralizedTransaction| SelectorResult::usable(Attribute::new(name, extract(transaction))))
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn select(&self, transaction: &GeneralizedTransaction) -> SelectorResult<A> {
        (self.extractor)(transaction)
    }

    /// Marks an absent value as unusable.
    pub fn reject_null(self) -> Self {
        self.decorate(|_, result| {
            if result.attribute.value.is_none() {
                result.reject()
            } else {
                result
            }
        })
    }

    /// Blanks the attribute for transactions dated before `cutover`.
    ///
    /// Used while an attribute is being rolled out: stored transactions from
    /// before the rollout never carried it, so both sides are treated as an
    /// explicitly permitted null and still join on the remaining attributes.
    pub fn disabled_before(self, cutover: NaiveDate) -> Self {
        self.decorate(move |transaction, result| {
            if transaction.date() < cutover {
                SelectorResult::usable(Attribute::absent(result.attribute.name))
            } else {
                result
            }
        })
    }

    fn decorate<F>(self, rule: F) -> Self
    where
        F: Fn(&GeneralizedTransaction, SelectorResult<A>) -> SelectorResult<A> + Send + Sync + 'static
    {
        let inner = self.extractor;

        Self {
            name: self.name,
            extractor: Arc::new(move |transaction: &GeneralizedTransaction| rule(transaction, inner(transaction)))
        }
    }
}

impl<A: IntoKeyPart + 'static> AttributeSelector<A> {
    /// Erases the attribute type so selectors of different types can form one key.
    pub fn into_key_selector(self) -> KeySelector {
        let inner = self.extractor;

        AttributeSelector {
            name: self.name,
            extractor: Arc::new(move |transaction: &GeneralizedTransaction| inner(transaction).map(IntoKeyPart::into_key_part))
        }
    }
}

impl AttributeSelector<String> {
    /// Marks an empty or whitespace-only value as unusable.
    pub fn reject_blank(self) -> Self {
        self.decorate(|_, result| {
            if result.attribute.value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                result.reject()
            } else {
                result
            }
        })
    }

    /// Marks placeholder values such as `N/A` as unusable. Comparison is trimmed and case-insensitive.
    pub fn reject_placeholder(self, sentinels: &'static [&'static str]) -> Self {
        self.decorate(move |_, result| {
            let is_placeholder = result.attribute.value.as_deref()
                .map(str::trim)
                .is_some_and(|value| sentinels.iter().any(|sentinel| sentinel.eq_ignore_ascii_case(value)));

            if is_placeholder {
                result.reject()
            } else {
                result
            }
        })
    }
}
