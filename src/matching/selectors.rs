//! Standard selectors used by the reconciliation chains.
//!
//! Every optional attribute is wrapped in `reject_null`, so an absent value
//! never joins another absent value unless a caller opts in explicitly
//! (see [`AttributeSelector::disabled_before`]).

use chrono::{DateTime, NaiveDate, Utc};

use crate::matching::attribute::CounterpartyIds;
use crate::matching::selector::AttributeSelector;
use crate::models::TransactionStatus;
use crate::types::Cents;

pub const EXTERNAL_ID: &str = "external_id";
pub const AMOUNT_IN_CENTS: &str = "amount_in_cents";
pub const DATE: &str = "date";
pub const BOOKING_DATE: &str = "booking_date";
pub const TIMESTAMP: &str = "timestamp";
pub const STATUS: &str = "status";
pub const DESCRIPTION: &str = "description";
pub const COUNTERPARTY_IDS: &str = "counterparty_ids";

/// Values providers send instead of leaving a field empty.
pub const PLACEHOLDER_SENTINELS: &[&str] = &["N/A", "NA", "-", "NOT PROVIDED", "UNKNOWN"];

pub fn external_id() -> AttributeSelector<String> {
    AttributeSelector::new(EXTERNAL_ID, |transaction| transaction.external_id().map(str::to_string))
        .reject_null()
        .reject_blank()
        .reject_placeholder(PLACEHOLDER_SENTINELS)
}

pub fn amount_in_cents() -> AttributeSelector<Cents> {
    AttributeSelector::new(AMOUNT_IN_CENTS, |transaction| transaction.amount_in_cents())
        .reject_null()
}

pub fn date() -> AttributeSelector<NaiveDate> {
    AttributeSelector::new(DATE, |transaction| Some(transaction.date()))
}

pub fn booking_date() -> AttributeSelector<NaiveDate> {
    AttributeSelector::new(BOOKING_DATE, |transaction| transaction.booking_date())
        .reject_null()
}

pub fn timestamp() -> AttributeSelector<DateTime<Utc>> {
    AttributeSelector::new(TIMESTAMP, |transaction| transaction.timestamp())
        .reject_null()
}

pub fn status() -> AttributeSelector<TransactionStatus> {
    AttributeSelector::new(STATUS, |transaction| Some(transaction.status()))
}

pub fn description() -> AttributeSelector<String> {
    AttributeSelector::new(DESCRIPTION, |transaction| Some(transaction.description().trim().to_string()))
        .reject_blank()
        .reject_placeholder(PLACEHOLDER_SENTINELS)
}

/// Debtor and creditor account numbers together; absent when neither is known.
pub fn counterparty_ids() -> AttributeSelector<CounterpartyIds> {
    AttributeSelector::new(COUNTERPARTY_IDS, |transaction| {
        let debtor = transaction.debtor_account_number().map(normalize_account_number);
        let creditor = transaction.creditor_account_number().map(normalize_account_number);

        if debtor.is_none() && creditor.is_none() {
            None
        } else {
            Some(CounterpartyIds { debtor, creditor })
        }
    })
    .reject_null()
}

fn normalize_account_number(account_number: &str) -> String {
    account_number.chars()
        .filter(|character| !character.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
