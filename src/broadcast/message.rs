/// Subscriber wire messages
///
/// Every outbound message is an envelope `{"type": ..., "data": ...}` with a
/// camelCase payload.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::holders::projector::{ListsView, StateView, Stats};
use crate::holders::{ActivityItem, ShameTitle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    InitialState,
    StatsUpdate,
    ListsUpdate,
    Buy,
    Sell,
    Activity,
    CaUpdate,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::InitialState => "INITIAL_STATE",
            MessageType::StatsUpdate => "STATS_UPDATE",
            MessageType::ListsUpdate => "LISTS_UPDATE",
            MessageType::Buy => "BUY",
            MessageType::Sell => "SELL",
            MessageType::Activity => "ACTIVITY",
            MessageType::CaUpdate => "CA_UPDATE",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePayload {
    pub wallet: String,
    pub amount: u64,
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shame: Option<ShameTitle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaUpdatePayload {
    pub contract_address: String,
}

impl Envelope {
    pub fn new<T: Serialize>(kind: MessageType, data: &T) -> Self {
        Self {
            kind,
            // Payloads are plain structs with string keys
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    pub fn initial_state(view: &StateView) -> Self {
        Self::new(MessageType::InitialState, view)
    }

    pub fn stats(stats: &Stats) -> Self {
        Self::new(MessageType::StatsUpdate, stats)
    }

    pub fn lists(lists: &ListsView) -> Self {
        Self::new(MessageType::ListsUpdate, lists)
    }

    pub fn buy(wallet: &str, amount: u64, signature: Option<&str>) -> Self {
        Self::new(
            MessageType::Buy,
            &TradePayload {
                wallet: wallet.to_string(),
                amount,
                signature: signature.map(str::to_string),
                shame: None,
            },
        )
    }

    pub fn sell(wallet: &str, amount: u64, signature: Option<&str>, shame: ShameTitle) -> Self {
        Self::new(
            MessageType::Sell,
            &TradePayload {
                wallet: wallet.to_string(),
                amount,
                signature: signature.map(str::to_string),
                shame: Some(shame),
            },
        )
    }

    pub fn activity(item: &ActivityItem) -> Self {
        Self::new(MessageType::Activity, item)
    }

    pub fn ca_update(contract_address: &str) -> Self {
        Self::new(
            MessageType::CaUpdate,
            &CaUpdatePayload {
                contract_address: contract_address.to_string(),
            },
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
