use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentDomain;
use crate::types::{AccountId, ActivityId, UserId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    pub user_id: UserId
}

/// One page of results from an enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentMessage {
    pub domain: EnrichmentDomain,
    pub version: u32,
    pub activity_id: ActivityId,
    pub message_key: MessageKey,
    pub is_last_page: bool,
    pub message_index: u32,
    pub message_total: u32,
    /// Domain-specific results; only their arrival matters here.
    #[serde(default)]
    pub payload: serde_json::Value
}

impl EnrichmentMessage {
    pub const SUPPORTED_VERSION: u32 = 1;

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn is_supported_version(&self) -> bool {
        self.version == Self::SUPPORTED_VERSION
    }
}

/// A stored transaction changed by applying an enrichment page.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedTransaction {
    pub account_id: AccountId,
    pub date: NaiveDate
}
