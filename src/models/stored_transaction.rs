use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::TransactionStatus;
use crate::types::{AccountId, TransactionId};

/// A transaction as previously persisted for an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredTransaction {
    /// Internal identifier assigned at insert time.
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub external_id: Option<String>,
    /// Signed amount; debits are negative.
    pub amount: Decimal,
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
