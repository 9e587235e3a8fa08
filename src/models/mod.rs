mod generalized;
mod provider_transaction;
mod stored_transaction;
#[cfg(test)]
pub(crate) mod fixtures;

use serde::{Deserialize, Serialize};

pub use generalized::GeneralizedTransaction;
pub use provider_transaction::ProviderTransaction;
pub use stored_transaction::StoredTransaction;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Booked,
    Pending,
    Hold
}

/// Direction of a provider transaction; providers report unsigned amounts.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit
}
