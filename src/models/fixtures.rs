use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{ProviderTransaction, StoredTransaction, TransactionStatus, TransactionType};

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid fixture date")
}

pub fn create_provider_transaction(external_id: Option<&str>, amount: &str, transaction_type: TransactionType, booked_on: &str) -> ProviderTransaction {
    ProviderTransaction {
        external_id: external_id.map(str::to_string),
        amount: Decimal::from_str(amount).expect("valid fixture amount"),
        transaction_type,
        status: TransactionStatus::Booked,
        date: date(booked_on),
        booking_date: None,
        timestamp: None,
        description: "Coffee Corner".to_string(),
        debtor_name: None,
        debtor_account_number: None,
        creditor_name: Some("Coffee Corner BV".to_string()),
        creditor_account_number: Some("NL91ABNA0417164300".to_string())
    }
}

pub fn create_stored_transaction(transaction_id: &str, external_id: Option<&str>, amount: &str, booked_on: &str) -> StoredTransaction {
    StoredTransaction {
        transaction_id: transaction_id.to_string(),
        account_id: Uuid::nil(),
        external_id: external_id.map(str::to_string),
        amount: Decimal::from_str(amount).expect("valid fixture amount"),
        status: TransactionStatus::Booked,
        date: date(booked_on),
        booking_date: None,
        timestamp: None,
        description: "Coffee Corner".to_string(),
        debtor_name: None,
        debtor_account_number: None,
        creditor_name: Some("Coffee Corner BV".to_string()),
        creditor_account_number: Some("NL91ABNA0417164300".to_string())
    }
}
