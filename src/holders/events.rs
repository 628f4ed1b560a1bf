/// Incremental transfer notifications (Helius enhanced transaction webhook)
///
/// Only the fields needed to classify a transaction as a buy or sell of the
/// tracked mint are modelled; everything else in the payload is ignored.
use serde::{Deserialize, Deserializer, Serialize};

use super::types::ActivityKind;

/// Numeric field that providers send either as a JSON number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    Number(f64),
    Text(String),
}

impl NumericValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumericValue::Number(n) => Some(*n),
            NumericValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Integer value, parsing strings exactly so large base-unit amounts keep precision
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NumericValue::Number(n) if n.is_finite() && *n >= 0.0 => Some(n.floor() as u64),
            NumericValue::Number(_) => None,
            NumericValue::Text(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|n| *n >= 0.0).map(|n| n.floor() as u64))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenAmount {
    pub token_amount: NumericValue,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub mint: Option<String>,
    #[serde(default)]
    pub token_amount: Option<NumericValue>,
    #[serde(default)]
    pub raw_token_amount: Option<RawTokenAmount>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    #[serde(default)]
    pub from_token_account: Option<String>,
    #[serde(default)]
    pub to_token_account: Option<String>,
}

impl TokenTransfer {
    /// Amount in base units
    ///
    /// Prefers the raw integer amount; a UI amount is scaled by `decimals` when
    /// known and otherwise taken as base units.
    pub fn base_amount(&self) -> u64 {
        if let Some(raw) = self.raw_token_amount.as_ref().and_then(|r| r.token_amount.as_u64()) {
            return raw;
        }

        let Some(amount) = self.token_amount.as_ref() else {
            return 0;
        };

        match self.decimals {
            Some(decimals) => amount
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| (n * 10f64.powi(decimals as i32)).round() as u64)
                .unwrap_or(0),
            None => amount.as_u64().unwrap_or(0),
        }
    }

    fn has_sender(&self) -> bool {
        self.from_user_account
            .as_deref()
            .map_or(false, |s| !s.is_empty())
    }
}

/// One enhanced transaction as delivered by the webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookTransaction {
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub fee_payer: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub token_transfers: Vec<TokenTransfer>,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: Option<NumericValue>,
    #[serde(default)]
    pub signature: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl WebhookTransaction {
    /// Decode one entry of a delivery; entries are decoded independently so a
    /// bad one only costs itself
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Timestamp in unix ms, fractional seconds truncated
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp
            .as_ref()
            .and_then(NumericValue::as_f64)
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| (secs * 1000.0) as i64)
    }

    pub fn involves_mint(&self, mint: &str) -> bool {
        self.token_transfers
            .iter()
            .any(|t| t.mint.as_deref() == Some(mint))
    }

    /// Wallet the event is attributed to
    pub fn wallet(&self) -> Option<&str> {
        self.fee_payer
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.source.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Classified buy or sell of the tracked asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderEvent {
    pub kind: ActivityKind,
    pub wallet: String,
    /// Base units
    pub amount: u64,
    pub signature: Option<String>,
    /// Unix ms
    pub timestamp: i64,
}

/// Turn a webhook transaction into a holder event for `mint`
///
/// Returns None when the transaction does not touch the mint or carries no
/// attributable wallet. `now_ms` stands in for a missing timestamp.
pub fn classify(tx: &WebhookTransaction, mint: &str, now_ms: i64) -> Option<HolderEvent> {
    let transfers: Vec<&TokenTransfer> = tx
        .token_transfers
        .iter()
        .filter(|t| t.mint.as_deref() == Some(mint))
        .collect();
    let first = *transfers.first()?;
    let wallet = tx.wallet()?;

    let explicit = match tx.tx_type.as_deref().map(|t| t.to_ascii_uppercase()) {
        Some(t) if t == "SELL" => Some(ActivityKind::Sell),
        Some(t) if t == "BUY" => Some(ActivityKind::Buy),
        _ => None,
    };

    let from_wallet = transfers
        .iter()
        .find(|t| t.from_user_account.as_deref() == Some(wallet));
    let to_wallet = transfers
        .iter()
        .find(|t| t.to_user_account.as_deref() == Some(wallet));

    let (kind, transfer) = match (explicit, from_wallet, to_wallet) {
        (Some(kind), Some(t), _) if kind == ActivityKind::Sell => (kind, *t),
        (Some(kind), _, Some(t)) if kind == ActivityKind::Buy => (kind, *t),
        (Some(kind), _, _) => (kind, first),
        (None, Some(t), _) => (ActivityKind::Sell, *t),
        (None, None, Some(t)) => (ActivityKind::Buy, *t),
        (None, None, None) => {
            if let Some(t) = transfers.iter().find(|t| t.has_sender()) {
                (ActivityKind::Sell, *t)
            } else {
                (ActivityKind::Buy, first)
            }
        }
    };

    let timestamp = tx.timestamp_ms().unwrap_or(now_ms);

    Some(HolderEvent {
        kind,
        wallet: wallet.to_string(),
        amount: transfer.base_amount(),
        signature: tx.signature.clone().filter(|s| !s.is_empty()),
        timestamp,
    })
}
