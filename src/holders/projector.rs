/// Derived views over the ledger: nice/naughty lists, stats and full state
///
/// Everything here is recomputed from the ledger on demand and never stored.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::ledger::Ledger;
use super::shame::ShameTitle;
use super::types::{ActivityItem, Holder, Seller};
use crate::config::LedgerConfig;

/// Badge shown next to a list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListBadge {
    Hodler,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NiceListEntry {
    pub address: String,
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_account: Option<String>,
    pub points: u64,
    pub status: ListBadge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaughtyListEntry {
    pub address: String,
    pub shame: ShameTitle,
    pub sold_at: i64,
    pub signature: Option<String>,
    pub sold_amount: Option<u64>,
    pub status: ListBadge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_holders: usize,
    pub nice_count: usize,
    pub naughty_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsView {
    pub nice_list: Vec<NiceListEntry>,
    pub naughty_list: Vec<NaughtyListEntry>,
}

/// Full projection sent to new subscribers and returned by the state query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    #[serde(flatten)]
    pub stats: Stats,
    pub nice_list: Vec<NiceListEntry>,
    pub naughty_list: Vec<NaughtyListEntry>,
    pub recent_activity: Vec<ActivityItem>,
    pub contract_address: Option<String>,
    pub token_mint: Option<String>,
    pub last_update: Option<i64>,
}

fn by_balance_desc(a: &Holder, b: &Holder) -> Ordering {
    b.balance
        .cmp(&a.balance)
        .then_with(|| a.address.cmp(&b.address))
}

fn by_sold_at_desc(a: &Seller, b: &Seller) -> Ordering {
    b.sold_at
        .cmp(&a.sold_at)
        .then_with(|| a.address.cmp(&b.address))
}

/// Holders by balance descending, capped at `cap`
pub fn nice_list(ledger: &Ledger, cap: usize, points_divisor: u64) -> Vec<NiceListEntry> {
    let divisor = points_divisor.max(1);
    let mut holders: Vec<&Holder> = ledger.holders().collect();
    holders.sort_by(|a, b| by_balance_desc(a, b));

    holders
        .into_iter()
        .take(cap)
        .map(|h| NiceListEntry {
            address: h.address.clone(),
            balance: h.balance,
            token_account: h.token_account.clone(),
            points: h.balance / divisor,
            status: ListBadge::Hodler,
        })
        .collect()
}

/// Sellers by sale time descending, capped at `cap`
pub fn naughty_list(ledger: &Ledger, cap: usize) -> Vec<NaughtyListEntry> {
    let mut sellers: Vec<&Seller> = ledger.sellers().collect();
    sellers.sort_by(|a, b| by_sold_at_desc(a, b));

    sellers
        .into_iter()
        .take(cap)
        .map(|s| NaughtyListEntry {
            address: s.address.clone(),
            shame: s.shame,
            sold_at: s.sold_at,
            signature: s.signature.clone(),
            sold_amount: s.sold_amount,
            status: ListBadge::Seller,
        })
        .collect()
}

/// Counts always reflect the full sets, not the capped lists
pub fn stats(ledger: &Ledger) -> Stats {
    Stats {
        total_holders: ledger.holder_count(),
        nice_count: ledger.holder_count(),
        naughty_count: ledger.seller_count(),
    }
}

pub fn lists(ledger: &Ledger, config: &LedgerConfig) -> ListsView {
    ListsView {
        nice_list: nice_list(ledger, config.list_cap, config.points_divisor),
        naughty_list: naughty_list(ledger, config.list_cap),
    }
}

pub fn recent_activity(ledger: &Ledger, cap: usize) -> Vec<ActivityItem> {
    ledger.activity().take(cap).cloned().collect()
}

/// Full state view with `activity_cap` activity entries
pub fn state_view(
    ledger: &Ledger,
    config: &LedgerConfig,
    activity_cap: usize,
    contract_address: Option<String>,
    token_mint: Option<String>,
) -> StateView {
    let ListsView {
        nice_list,
        naughty_list,
    } = lists(ledger, config);

    StateView {
        stats: stats(ledger),
        nice_list,
        naughty_list,
        recent_activity: recent_activity(ledger, activity_cap),
        contract_address,
        token_mint,
        last_update: ledger.last_update(),
    }
}
