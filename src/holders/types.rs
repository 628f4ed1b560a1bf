/// Holder ledger data model
use serde::{Deserialize, Serialize};

use super::shame::ShameTitle;

/// Canonical snapshot entry produced by every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderRecord {
    /// Owner wallet address
    pub address: String,
    /// Balance in base units
    pub balance: u64,
    /// Token account holding the balance
    pub token_account: String,
}

impl HolderRecord {
    pub fn new(address: impl Into<String>, balance: u64, token_account: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            balance,
            token_account: token_account.into(),
        }
    }
}

/// Address currently holding the tracked asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub address: String,
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_account: Option<String>,
    /// Unix ms
    pub first_seen: i64,
    /// Unix ms
    pub last_seen: i64,
    /// Last incremental event applied to this holder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Address that divested; never removed once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub address: String,
    /// Unix ms
    pub sold_at: i64,
    pub shame: ShameTitle,
    pub signature: Option<String>,
    pub sold_amount: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Buy,
    Sell,
}

/// One entry of the most-recent-first activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub address: String,
    pub amount: u64,
    pub signature: Option<String>,
    /// Unix ms
    pub timestamp: i64,
}

/// Membership of a single address in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddressStatus {
    Nice,
    Naughty,
    Unknown,
}

/// Answer to a single-address query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressReport {
    pub address: String,
    pub balance: u64,
    pub status: AddressStatus,
    pub first_seen: Option<i64>,
    pub last_activity: Option<i64>,
    pub is_nice: bool,
    pub is_naughty: bool,
}

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
