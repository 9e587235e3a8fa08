use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::models::{ProviderTransaction, StoredTransaction, TransactionStatus, TransactionType};
use crate::types::Cents;

/// Origin-agnostic, read-only view over a provider or a stored transaction.
///
/// Matching only ever reads attributes through this type, so a selector works
/// the same on both sides of a reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralizedTransaction {
    Provider(ProviderTransaction),
    Stored(StoredTransaction)
}

impl GeneralizedTransaction {
    pub fn external_id(&self) -> Option<&str> {
        match self {
            Self::Provider(transaction) => transaction.external_id.as_deref(),
            Self::Stored(transaction) => transaction.external_id.as_deref()
        }
    }

    /// Signed amount in cents, or `None` when the amount cannot be represented.
    pub fn amount_in_cents(&self) -> Option<Cents> {
        let result = match self {
            Self::Provider(transaction) => Cents::from_decimal(transaction.amount.abs())
                .and_then(|cents| match transaction.transaction_type {
                    TransactionType::Debit => cents.checked_neg(),
                    TransactionType::Credit => Ok(cents)
                }),
            Self::Stored(transaction) => Cents::from_decimal(transaction.amount)
        };

        result.map_err(|error| warn!("{error}")).ok()
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Provider(transaction) => transaction.date,
            Self::Stored(transaction) => transaction.date
        }
    }

    pub fn status(&self) -> TransactionStatus {
        match self {
            Self::Provider(transaction) => transaction.status,
            Self::Stored(transaction) => transaction.status
        }
    }

    pub fn booking_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Provider(transaction) => transaction.booking_date,
            Self::Stored(transaction) => transaction.booking_date
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Provider(transaction) => transaction.timestamp,
            Self::Stored(transaction) => transaction.timestamp
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Provider(transaction) => &transaction.description,
            Self::Stored(transaction) => &transaction.description
        }
    }

    pub fn debtor_name(&self) -> Option<&str> {
        match self {
            Self::Provider(transaction) => transaction.debtor_name.as_deref(),
            Self::Stored(transaction) => transaction.debtor_name.as_deref()
        }
    }

    pub fn debtor_account_number(&self) -> Option<&str> {
        match self {
            Self::Provider(transaction) => transaction.debtor_account_number.as_deref(),
            Self::Stored(transaction) => transaction.debtor_account_number.as_deref()
        }
    }

    pub fn creditor_name(&self) -> Option<&str> {
        match self {
            Self::Provider(transaction) => transaction.creditor_name.as_deref(),
            Self::Stored(transaction) => transaction.creditor_name.as_deref()
        }
    }

    pub fn creditor_account_number(&self) -> Option<&str> {
        match self {
            Self::Provider(transaction) => transaction.creditor_account_number.as_deref(),
            Self::Stored(transaction) => transaction.creditor_account_number.as_deref()
        }
    }

    pub fn as_provider(&self) -> Option<&ProviderTransaction> {
        match self {
            Self::Provider(transaction) => Some(transaction),
            Self::Stored(_) => None
        }
    }

    pub fn as_stored(&self) -> Option<&StoredTransaction> {
        match self {
            Self::Provider(_) => None,
            Self::Stored(transaction) => Some(transaction)
        }
    }
}

impl From<ProviderTransaction> for GeneralizedTransaction {
    fn from(transaction: ProviderTransaction) -> Self {
        Self::Provider(transaction)
    }
}

impl From<StoredTransaction> for GeneralizedTransaction {
    fn from(transaction: StoredTransaction) -> Self {
        Self::Stored(transaction)
    }
}
