/// Holder ledger: reconciliation of full snapshots and incremental events
///
/// The ledger is the single owner of holder/seller state and the activity
/// feed. It is plain data plus synchronous methods; callers wrap it in a lock
/// so every method call is one atomic step for readers.
///
/// Invariants kept by every method:
/// - an address is never both a holder and a seller
/// - the seller set only grows (until the tracked asset changes)
/// - the activity feed never exceeds `activity_cap`
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet, VecDeque};

use super::events::HolderEvent;
use super::shame::ShameTitle;
use super::types::{
    ActivityItem, ActivityKind, AddressReport, AddressStatus, Holder, HolderRecord, Seller,
};
use crate::config::LedgerConfig;

// ============================================================================
// SIGNATURE WINDOW
// ============================================================================

/// Bounded set of recently applied transaction signatures (FIFO eviction)
#[derive(Debug)]
struct SignatureWindow {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl SignatureWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns false if the signature was already recorded
    fn insert(&mut self, signature: &str) -> bool {
        if self.seen.contains(signature) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(signature.to_string());
        self.seen.insert(signature.to_string());
        true
    }

    fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of reconciling one snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Holders present after reconciliation
    pub holders: usize,
    /// Sellers inferred by this snapshot
    pub new_sellers: Vec<String>,
    /// Snapshot entries skipped because the address already sold
    pub skipped_sellers: usize,
    /// The ledger was cleared because the tracked asset changed
    pub asset_changed: bool,
}

/// Result of applying one incremental event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Signature already applied; nothing changed
    Duplicate,
    /// Address was already a seller; nothing changed
    AlreadySeller,
    Sold {
        seller: Seller,
        activity: ActivityItem,
    },
    /// `holder` is None when the buyer is a permanent seller and was not reinstated
    Bought {
        holder: Option<Holder>,
        activity: ActivityItem,
    },
}

impl IngestOutcome {
    pub fn changed_ledger(&self) -> bool {
        matches!(self, IngestOutcome::Sold { .. } | IngestOutcome::Bought { .. })
    }
}

// ============================================================================
// LEDGER
// ============================================================================

pub struct Ledger {
    asset: Option<String>,
    holders: HashMap<String, Holder>,
    sellers: HashMap<String, Seller>,
    activity: VecDeque<ActivityItem>,
    activity_cap: usize,
    signatures: Option<SignatureWindow>,
    rng: StdRng,
    last_update: Option<i64>,
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Ledger with an explicit random source for shame labels
    pub fn with_rng(config: &LedgerConfig, rng: StdRng) -> Self {
        Self {
            asset: None,
            holders: HashMap::new(),
            sellers: HashMap::new(),
            activity: VecDeque::with_capacity(config.activity_cap),
            activity_cap: config.activity_cap.max(1),
            signatures: config
                .dedupe_signatures
                .then(|| SignatureWindow::new(config.dedupe_capacity)),
            rng,
            last_update: None,
        }
    }

    pub fn asset(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    pub fn holder(&self, address: &str) -> Option<&Holder> {
        self.holders.get(address)
    }

    pub fn seller(&self, address: &str) -> Option<&Seller> {
        self.sellers.get(address)
    }

    pub fn holders(&self) -> impl Iterator<Item = &Holder> {
        self.holders.values()
    }

    pub fn sellers(&self) -> impl Iterator<Item = &Seller> {
        self.sellers.values()
    }

    /// Most recent first
    pub fn activity(&self) -> impl Iterator<Item = &ActivityItem> {
        self.activity.iter()
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    pub fn seller_count(&self) -> usize {
        self.sellers.len()
    }

    pub fn activity_len(&self) -> usize {
        self.activity.len()
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }

    /// Drop all state and start tracking `asset`
    fn reset_for_asset(&mut self, asset: &str) {
        self.holders.clear();
        self.sellers.clear();
        self.activity.clear();
        if let Some(window) = self.signatures.as_mut() {
            window.clear();
        }
        self.asset = Some(asset.to_string());
    }

    /// Make sure the ledger tracks `asset`, clearing it if it tracked another one
    ///
    /// Returns true when existing state was discarded.
    pub fn ensure_asset(&mut self, asset: &str) -> bool {
        match self.asset.as_deref() {
            Some(current) if current == asset => false,
            Some(_) => {
                self.reset_for_asset(asset);
                true
            }
            None => {
                self.asset = Some(asset.to_string());
                false
            }
        }
    }

    /// Diff a full snapshot against the ledger
    ///
    /// Every snapshot address becomes (or stays) a holder unless it already
    /// sold. Every previous holder missing from the snapshot becomes a seller.
    /// Duplicate owners within one snapshot are summed.
    pub fn reconcile(&mut self, asset: &str, snapshot: &[HolderRecord], now: i64) -> ReconcileSummary {
        let asset_changed = self.ensure_asset(asset);

        let mut previous: HashSet<String> = self.holders.keys().cloned().collect();
        let mut merged: HashMap<&str, (u64, &str)> = HashMap::with_capacity(snapshot.len());
        for record in snapshot {
            merged
                .entry(record.address.as_str())
                .and_modify(|(balance, _)| *balance = balance.saturating_add(record.balance))
                .or_insert((record.balance, record.token_account.as_str()));
        }

        let mut skipped_sellers = 0;
        for (address, (balance, token_account)) in merged {
            if self.sellers.contains_key(address) {
                skipped_sellers += 1;
                continue;
            }

            previous.remove(address);
            let token_account = (!token_account.is_empty()).then(|| token_account.to_string());

            match self.holders.get_mut(address) {
                Some(holder) => {
                    holder.balance = balance;
                    holder.last_seen = now;
                    if token_account.is_some() {
                        holder.token_account = token_account;
                    }
                }
                None => {
                    self.holders.insert(
                        address.to_string(),
                        Holder {
                            address: address.to_string(),
                            balance,
                            token_account,
                            first_seen: now,
                            last_seen: now,
                            signature: None,
                        },
                    );
                }
            }
        }

        let mut new_sellers: Vec<String> = previous.into_iter().collect();
        new_sellers.sort();
        for address in &new_sellers {
            self.holders.remove(address);
            let shame = ShameTitle::pick(&mut self.rng);
            self.sellers.entry(address.clone()).or_insert_with(|| Seller {
                address: address.clone(),
                sold_at: now,
                shame,
                signature: None,
                sold_amount: None,
            });
        }

        self.last_update = Some(now);

        ReconcileSummary {
            holders: self.holders.len(),
            new_sellers,
            skipped_sellers,
            asset_changed,
        }
    }

    /// Apply one buy/sell notification
    pub fn apply_event(&mut self, event: &HolderEvent) -> IngestOutcome {
        if let (Some(window), Some(signature)) = (self.signatures.as_mut(), event.signature.as_deref()) {
            if !window.insert(signature) {
                return IngestOutcome::Duplicate;
            }
        }

        let activity = ActivityItem {
            kind: event.kind,
            address: event.wallet.clone(),
            amount: event.amount,
            signature: event.signature.clone(),
            timestamp: event.timestamp,
        };

        let outcome = match event.kind {
            ActivityKind::Sell => {
                if self.sellers.contains_key(&event.wallet) {
                    return IngestOutcome::AlreadySeller;
                }

                let seller = Seller {
                    address: event.wallet.clone(),
                    sold_at: event.timestamp,
                    shame: ShameTitle::pick(&mut self.rng),
                    signature: event.signature.clone(),
                    sold_amount: Some(event.amount),
                };
                self.sellers.insert(event.wallet.clone(), seller.clone());
                self.holders.remove(&event.wallet);

                IngestOutcome::Sold {
                    seller,
                    activity: activity.clone(),
                }
            }
            ActivityKind::Buy => {
                let holder = if self.sellers.contains_key(&event.wallet) {
                    None
                } else {
                    let holder = self
                        .holders
                        .entry(event.wallet.clone())
                        .or_insert_with(|| Holder {
                            address: event.wallet.clone(),
                            balance: 0,
                            token_account: None,
                            first_seen: event.timestamp,
                            last_seen: event.timestamp,
                            signature: None,
                        });
                    holder.balance = holder.balance.saturating_add(event.amount);
                    holder.last_seen = event.timestamp;
                    holder.signature = event.signature.clone();
                    Some(holder.clone())
                };

                IngestOutcome::Bought {
                    holder,
                    activity: activity.clone(),
                }
            }
        };

        self.push_activity(activity);
        self.last_update = Some(event.timestamp);
        outcome
    }

    fn push_activity(&mut self, item: ActivityItem) {
        self.activity.push_front(item);
        self.activity.truncate(self.activity_cap);
    }

    /// Status of a single address
    pub fn query(&self, address: &str) -> AddressReport {
        let (balance, status, first_seen, last_activity) =
            if let Some(seller) = self.sellers.get(address) {
                (0, AddressStatus::Naughty, None, Some(seller.sold_at))
            } else if let Some(holder) = self.holders.get(address) {
                (
                    holder.balance,
                    AddressStatus::Nice,
                    Some(holder.first_seen),
                    Some(holder.last_seen),
                )
            } else {
                (0, AddressStatus::Unknown, None, None)
            };

        AddressReport {
            address: address.to_string(),
            balance,
            status,
            first_seen,
            last_activity,
            is_nice: status == AddressStatus::Nice,
            is_naughty: status == AddressStatus::Naughty,
        }
    }
}
