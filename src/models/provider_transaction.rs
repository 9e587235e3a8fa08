use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{TransactionStatus, TransactionType};

/// A transaction exactly as a provider reported it during a refresh.
///
/// Providers restate their history on every fetch, so the same real-world
/// transaction shows up again with possibly drifted attributes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderTransaction {
    /// The provider's own identifier, when it supplies one.
    pub external_id: Option<String>,
    /// Unsigned amount; the sign comes from `transaction_type`.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub date: NaiveDate,
    pub booking_date: Option<NaiveDate>,
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
    pub debtor_name: Option<String>,
    pub debtor_account_number: Option<String>,
    pub creditor_name: Option<String>,
    pub creditor_account_number: Option<String>
}
