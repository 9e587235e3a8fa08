//! Consistency layer for aggregated financial data.
//!
//! [`matching`] reconciles a provider's restated transaction history against
//! what is already stored, and [`tracker`] decides when every enrichment
//! pipeline triggered by an activity has reported back.

pub mod actors;
pub mod config;
pub mod engine;
pub mod enrichment;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod storage;
pub mod tracker;
pub mod types;
