use chrono::{DateTime, NaiveDate, Utc};

use crate::models::TransactionStatus;
use crate::types::Cents;

/// A named attribute read from a transaction. The value may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<A> {
    pub name: &'static str,
    pub value: Option<A>
}

impl<A> Attribute<A> {
    pub fn new(name: &'static str, value: Option<A>) -> Self {
        Self { name, value }
    }

    pub fn absent(name: &'static str) -> Self {
        Self { name, value: None }
    }
}

/// Outcome of selecting one attribute.
///
/// An unusable attribute rejects the owning transaction for the whole pass,
/// whatever the other selectors return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorResult<A> {
    pub attribute: Attribute<A>,
    pub usable: bool
}

impl<A> SelectorResult<A> {
    pub fn usable(attribute: Attribute<A>) -> Self {
        Self { attribute, usable: true }
    }

    pub fn unusable(attribute: Attribute<A>) -> Self {
        Self { attribute, usable: false }
    }

    pub fn reject(self) -> Self {
        Self { usable: false, ..self }
    }

    pub fn map<B>(self, transform: impl FnOnce(A) -> B) -> SelectorResult<B> {
        SelectorResult {
            attribute: Attribute::new(self.attribute.name, self.attribute.value.map(transform)),
            usable: self.usable
        }
    }
}

/// The identifying account numbers on either side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterpartyIds {
    pub debtor: Option<String>,
    pub creditor: Option<String>
}

/// One component of a composite matching key.
///
/// `Null` only appears for attributes a selector explicitly allowed to be
/// absent; every other absent attribute has already rejected its transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Null,
    Text(String),
    Amount(Cents),
    Date(NaiveDate),
    Instant(DateTime<Utc>),
    Status(TransactionStatus),
    Counterparty(CounterpartyIds)
}

pub trait IntoKeyPart {
    fn into_key_part(self) -> KeyPart;
}

impl IntoKeyPart for KeyPart {
    fn into_key_part(self) -> KeyPart {
        self
    }
}

impl IntoKeyPart for String {
    fn into_key_part(self) -> KeyPart {
        KeyPart::Text(self)
    }
}

impl IntoKeyPart for Cents {
    fn into_key_part(self) -> KeyPart {
        KeyPart::Amount(self)
    }
}

impl IntoKeyPart for NaiveDate {
    fn into_key_part(self) -> KeyPart {
        KeyPart::Date(self)
    }
}

impl IntoKeyPart for DateTime<Utc> {
    fn into_key_part(self) -> KeyPart {
        KeyPart::Instant(self)
    }
}

impl IntoKeyPart for TransactionStatus {
    fn into_key_part(self) -> KeyPart {
        KeyPart::Status(self)
    }
}

impl IntoKeyPart for CounterpartyIds {
    fn into_key_part(self) -> KeyPart {
        KeyPart::Counterparty(self)
    }
}
