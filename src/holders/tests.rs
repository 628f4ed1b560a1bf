//! End-to-end scenarios through `HolderService` with in-memory providers

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use super::fetcher::tests::FakeResolver;
use super::*;
use crate::broadcast::{Envelope, MessageType};
use crate::config::Config;
use crate::errors::{HolderWatchError, ProviderError};

const SECRET: &str = "let-me-in";
const START: i64 = 1_700_000_000_000;

fn addr(n: u8) -> String {
    bs58::encode([n; 32]).into_string()
}

/// Provider whose snapshot can be swapped between refreshes
struct SnapshotProvider {
    snapshot: Mutex<Vec<HolderRecord>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl SnapshotProvider {
    fn new(gate: Option<Arc<Notify>>) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(Vec::new()),
            gate,
            calls: AtomicUsize::new(0),
        })
    }

    fn set(&self, holders: &[(u8, u64)]) {
        *self.snapshot.lock() = holders
            .iter()
            .map(|(n, balance)| HolderRecord::new(addr(*n), *balance, format!("ata-{}", n)))
            .collect();
    }
}

#[async_trait]
impl HolderProvider for SnapshotProvider {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch_holders(&self, _mint: &str) -> std::result::Result<Vec<HolderRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.snapshot.lock().clone())
    }
}

struct Harness {
    service: Arc<HolderService>,
    provider: Arc<SnapshotProvider>,
    clock: Arc<AtomicI64>,
    mint: String,
}

impl Harness {
    fn build(config: Config, gate: Option<Arc<Notify>>, resolver: Option<Arc<dyn PoolResolver>>) -> Self {
        let provider = SnapshotProvider::new(gate);
        let fetcher = HolderFetcher::new(
            resolver,
            vec![provider.clone() as Arc<dyn HolderProvider>],
            Duration::from_secs(5),
        );

        let clock = Arc::new(AtomicI64::new(START));
        let ticking = clock.clone();
        let service = HolderService::with_options(
            &config,
            fetcher,
            ServiceOptions {
                rng: Some(StdRng::seed_from_u64(99)),
                clock: Some(Arc::new(move || ticking.load(Ordering::SeqCst))),
            },
        );

        Self {
            service,
            provider,
            clock,
            mint: addr(200),
        }
    }

    fn new() -> Self {
        Self::build(config(), None, None)
    }

    fn advance(&self, ms: i64) {
        self.clock.fetch_add(ms, Ordering::SeqCst);
    }

    fn advance_interval(&self) {
        self.advance(Config::default().refresh.interval_secs as i64 * 1000);
    }

    async fn refresh(&self, holders: &[(u8, u64)]) -> RefreshOutcome {
        self.provider.set(holders);
        self.service
            .trigger_refresh(SECRET, &self.mint)
            .await
            .unwrap()
    }

    fn ingest(&self, txs: serde_json::Value) -> IngestReport {
        let entries: Vec<serde_json::Value> = serde_json::from_value(txs).unwrap();
        self.service.ingest_payload(None, entries).unwrap()
    }

    fn buy(&self, wallet: &str, amount: u64, signature: &str) -> serde_json::Value {
        json!({
            "type": "SWAP",
            "feePayer": wallet,
            "signature": signature,
            "timestamp": START / 1000 + 60,
            "tokenTransfers": [{
                "mint": self.mint,
                "tokenAmount": amount,
                "fromUserAccount": "PoolVault",
                "toUserAccount": wallet
            }]
        })
    }

    fn sell(&self, wallet: &str, amount: u64, signature: &str) -> serde_json::Value {
        json!({
            "type": "SWAP",
            "feePayer": wallet,
            "signature": signature,
            "timestamp": START / 1000 + 120,
            "tokenTransfers": [{
                "mint": self.mint,
                "tokenAmount": amount,
                "fromUserAccount": wallet,
                "toUserAccount": "PoolVault"
            }]
        })
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.auth.admin_secret = SECRET.to_string();
    config.webserver.websocket.buffer_size = 64;
    config
}

fn drain(rx: &mut mpsc::Receiver<Envelope>) -> Vec<Envelope> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.push(envelope);
    }
    out
}

fn kinds(messages: &[Envelope]) -> Vec<MessageType> {
    messages.iter().map(|m| m.kind).collect()
}

fn assert_exclusive(view: &StateView) {
    for nice in &view.nice_list {
        assert!(
            view.naughty_list.iter().all(|n| n.address != nice.address),
            "{} on both lists",
            nice.address
        );
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn scenario_snapshot_diff_infers_seller() {
    let h = Harness::new();
    let (_, mut rx) = h.service.subscribe();

    h.refresh(&[(1, 100), (2, 50)]).await;
    h.advance_interval();
    let outcome = h.refresh(&[(2, 50)]).await;
    assert!(outcome.ledger_updated);

    let view = h.service.state_view();
    let nice: Vec<_> = view.nice_list.iter().map(|e| e.address.clone()).collect();
    let naughty: Vec<_> = view.naughty_list.iter().map(|e| e.address.clone()).collect();
    assert_eq!(nice, vec![addr(2)]);
    assert_eq!(naughty, vec![addr(1)]);
    assert!(ShameTitle::ALL.contains(&view.naughty_list[0].shame));

    assert_eq!(
        kinds(&drain(&mut rx)),
        vec![
            MessageType::InitialState,
            MessageType::ListsUpdate,
            MessageType::StatsUpdate,
            MessageType::CaUpdate,
            MessageType::ListsUpdate,
            MessageType::StatsUpdate,
        ]
    );
}

#[tokio::test]
async fn scenario_buy_creates_holder() {
    let h = Harness::new();
    h.refresh(&[(2, 50)]).await;

    let z = addr(26);
    let report = h.ingest(json!([h.buy(&z, 20, "buy-sig")]));
    assert_eq!(report.processed, 1);

    let view = h.service.state_view();
    let entry = view.nice_list.iter().find(|e| e.address == z).unwrap();
    assert_eq!(entry.balance, 20);

    let first = &view.recent_activity[0];
    assert_eq!(first.kind, ActivityKind::Buy);
    assert_eq!(first.address, z);
    assert_eq!(first.amount, 20);
    assert_eq!(first.timestamp, (START / 1000 + 60) * 1000);
}

#[tokio::test]
async fn scenario_sell_broadcasts_once() {
    let h = Harness::new();
    h.refresh(&[(1, 100), (2, 50)]).await;
    let (_, mut rx) = h.service.subscribe();
    drain(&mut rx);

    let x = addr(1);
    h.ingest(json!([h.sell(&x, 100, "sell-sig")]));

    let messages = drain(&mut rx);
    assert_eq!(
        kinds(&messages),
        vec![
            MessageType::Sell,
            MessageType::Activity,
            MessageType::ListsUpdate,
            MessageType::StatsUpdate,
        ]
    );
    assert_eq!(messages[2].data["naughtyList"][0]["address"], x.as_str());
    let sell = &messages[0].data;
    assert_eq!(sell["wallet"], x.as_str());
    assert_eq!(sell["signature"], "sell-sig");
    let shame: ShameTitle = serde_json::from_value(sell["shame"].clone()).unwrap();
    assert!(ShameTitle::ALL.contains(&shame));

    let report = h.service.query_address(&x).unwrap();
    assert_eq!(report.status, AddressStatus::Naughty);
    assert!(report.is_naughty);
}

#[tokio::test]
async fn scenario_new_subscriber_gets_one_initial_state() {
    let h = Harness::new();
    h.refresh(&[(1, 10), (2, 20), (3, 30), (4, 40), (5, 50)]).await;
    h.advance_interval();
    h.refresh(&[(1, 10), (2, 20), (3, 30)]).await;

    let (_, mut rx) = h.service.subscribe();
    let messages = drain(&mut rx);
    assert_eq!(kinds(&messages), vec![MessageType::InitialState]);
    assert_eq!(messages[0].data["niceCount"], 3);
    assert_eq!(messages[0].data["naughtyCount"], 2);
    assert_eq!(messages[0].data["contractAddress"], h.mint.as_str());
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[tokio::test]
async fn unchanged_snapshot_is_idempotent() {
    let h = Harness::new();
    h.refresh(&[(1, 10), (2, 20)]).await;
    let before = h.service.state_view();

    h.advance_interval();
    h.refresh(&[(1, 10), (2, 20)]).await;
    let after = h.service.state_view();

    assert_eq!(after.stats.naughty_count, 0);
    assert_eq!(before.stats, after.stats);
    assert_eq!(before.nice_list, after.nice_list);
    assert_eq!(before.naughty_list, after.naughty_list);
}

#[tokio::test]
async fn sellers_stay_sellers() {
    let h = Harness::new();
    let x = addr(1);
    h.refresh(&[(1, 100), (2, 50)]).await;
    h.ingest(json!([h.sell(&x, 100, "s1")]));

    // Reappears in a snapshot and buys again: still naughty
    h.advance_interval();
    h.refresh(&[(1, 500), (2, 50)]).await;
    h.ingest(json!([h.buy(&x, 5, "b1")]));

    let view = h.service.state_view();
    assert_exclusive(&view);
    assert!(view.naughty_list.iter().any(|e| e.address == x));
    assert!(view.nice_list.iter().all(|e| e.address != x));
    assert_eq!(view.recent_activity[0].kind, ActivityKind::Buy);
}

#[tokio::test]
async fn activity_stays_capped() {
    let mut cfg = config();
    cfg.ledger.activity_cap = 10;
    let h = Harness::build(cfg, None, None);
    h.refresh(&[(1, 1)]).await;

    for i in 0..40u8 {
        let wallet = addr(50 + i);
        let tx = if i % 2 == 0 {
            h.buy(&wallet, 1, &format!("sig-{}", i))
        } else {
            h.sell(&wallet, 1, &format!("sig-{}", i))
        };
        h.ingest(json!([tx]));
    }

    assert_eq!(h.service.state_view().recent_activity.len(), 10);
}

#[tokio::test]
async fn redelivered_signature_not_applied_twice() {
    let h = Harness::new();
    h.refresh(&[(1, 1)]).await;

    let z = addr(26);
    let tx = h.buy(&z, 20, "same-sig");
    h.ingest(json!([tx.clone()]));
    let report = h.ingest(json!([tx]));

    assert_eq!(report.duplicates, 1);
    assert_eq!(report.processed, 0);
    assert_eq!(h.service.query_address(&z).unwrap().balance, 20);
}

#[tokio::test]
async fn webhook_ignores_other_mints_and_untracked_state() {
    let h = Harness::new();
    let z = addr(26);

    // Nothing tracked yet
    let report = h.ingest(json!([h.buy(&z, 1, "early")]));
    assert_eq!(report.ignored, 1);

    h.refresh(&[(1, 1)]).await;
    let foreign = json!([{
        "feePayer": z,
        "signature": "other",
        "tokenTransfers": [{ "mint": "SomethingElse", "tokenAmount": 5, "toUserAccount": z }]
    }]);
    let report = h.ingest(foreign);
    assert_eq!(report.received, 1);
    assert_eq!(report.ignored, 1);
    assert_eq!(h.service.query_address(&z).unwrap().status, AddressStatus::Unknown);
}

#[tokio::test]
async fn sellers_monotonic_per_asset_only() {
    let h = Harness::new();
    let x = addr(1);
    h.refresh(&[(1, 100), (2, 50)]).await;
    h.ingest(json!([h.sell(&x, 100, "s1")]));

    // Same asset again: the seller survives
    h.advance_interval();
    h.refresh(&[(2, 50)]).await;
    assert_eq!(h.service.state_view().stats.naughty_count, 1);

    // Switching assets starts a fresh ledger
    h.advance_interval();
    h.provider.set(&[(3, 7)]);
    let other = addr(201);
    let outcome = h.service.trigger_refresh(SECRET, &other).await.unwrap();
    assert!(outcome.ledger_updated);

    let view = h.service.state_view();
    assert_eq!(view.stats.naughty_count, 0);
    assert!(view.recent_activity.is_empty());
    assert_eq!(view.token_mint.as_deref(), Some(other.as_str()));
    assert_eq!(h.service.query_address(&x).unwrap().status, AddressStatus::Unknown);
}

#[tokio::test]
async fn bad_entries_do_not_sink_the_batch() {
    let h = Harness::new();
    let y = addr(25);
    h.refresh(&[(1, 10)]).await;

    let report = h.ingest(json!([
        { "type": "TRANSFER", "feePayer": y, "signature": "n1", "tokenTransfers": null },
        h.buy(&y, 40, "good"),
        { "feePayer": y, "signature": "bad", "tokenTransfers": [{ "mint": 7 }] },
        "not an object",
        {
            "feePayer": y,
            "signature": "float-ts",
            "timestamp": 1_700_000_100.5,
            "tokenTransfers": [{ "mint": h.mint, "tokenAmount": 2, "toUserAccount": y }]
        }
    ]));

    assert_eq!(report.received, 5);
    assert_eq!(report.processed, 2);
    assert_eq!(report.ignored, 3);

    let entry = h.service.query_address(&y).unwrap();
    assert_eq!(entry.status, AddressStatus::Holder);
    assert_eq!(h.service.state_view().stats.nice_count, 2);
}

// ============================================================================
// CONTROL OPERATIONS
// ============================================================================

#[tokio::test]
async fn second_trigger_within_interval_rate_limited() {
    let h = Harness::new();
    h.refresh(&[(1, 1)]).await;
    h.advance(30_000);

    let err = h
        .service
        .trigger_refresh(SECRET, &h.mint)
        .await
        .unwrap_err();
    match err {
        HolderWatchError::RateLimited {
            wait_secs,
            next_allowed_ms,
        } => {
            assert_eq!(wait_secs, 150);
            assert!(wait_secs <= 180);
            assert_eq!(next_allowed_ms, START + 180_000);
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn trigger_during_refresh_rejected() {
    let gate = Arc::new(Notify::new());
    let h = Harness::build(config(), Some(gate.clone()), None);
    h.provider.set(&[(1, 10)]);

    let service = h.service.clone();
    let mint = h.mint.clone();
    let first = tokio::spawn(async move { service.trigger_refresh(SECRET, &mint).await });

    for _ in 0..1000 {
        if h.provider.calls.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(h.service.is_refreshing());

    let err = h.service.trigger_refresh(SECRET, &h.mint).await.unwrap_err();
    match err {
        HolderWatchError::RefreshInProgress { wait_secs } => {
            assert!(wait_secs > 0);
            assert!(wait_secs <= Config::default().refresh.interval_secs);
        }
        other => panic!("expected refresh in progress, got {:?}", other),
    }

    // A tick during the refresh is skipped as well
    assert!(h.service.run_scheduled_refresh().await.is_none());

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome.holders_count, 1);
    assert!(!h.service.is_refreshing());
}

#[tokio::test]
async fn empty_result_leaves_ledger_untouched() {
    let h = Harness::new();
    h.refresh(&[(1, 10), (2, 20)]).await;

    h.advance_interval();
    let outcome = h.refresh(&[]).await;
    assert!(!outcome.ledger_updated);
    assert_eq!(outcome.holders_count, 0);

    let view = h.service.state_view();
    assert_eq!(view.stats.nice_count, 2);
    assert_eq!(view.stats.naughty_count, 0);

    // The attempt still counts for the rate gate
    let err = h.service.trigger_refresh(SECRET, &h.mint).await.unwrap_err();
    assert!(matches!(err, HolderWatchError::RateLimited { .. }));
}

#[tokio::test]
async fn control_operations_require_secret() {
    let h = Harness::new();
    assert!(!h.service.verify_secret("wrong"));
    assert!(h.service.verify_secret(SECRET));

    let err = h.service.trigger_refresh("wrong", &h.mint).await.unwrap_err();
    assert_eq!(err, HolderWatchError::Unauthorized);
    assert_eq!(
        h.service.set_tracked_address("wrong", &addr(9)).unwrap_err(),
        HolderWatchError::Unauthorized
    );
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);

    let open = Harness::build(Config::default(), None, None);
    assert!(!open.service.verify_secret(""));
}

#[tokio::test]
async fn malformed_address_rejected_before_fetch() {
    let h = Harness::new();
    let err = h
        .service
        .trigger_refresh(SECRET, "definitely not base58!")
        .await
        .unwrap_err();
    assert!(matches!(err, HolderWatchError::Validation { field: "mintAddress", .. }));
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);

    assert!(h.service.query_address("0OIl").is_err());
}

#[tokio::test]
async fn pool_input_sets_contract_address() {
    let pool = addr(150);
    let mint = addr(151);
    let resolver: Arc<dyn PoolResolver> = Arc::new(FakeResolver {
        pools: vec![(
            Box::leak(pool.clone().into_boxed_str()),
            Box::leak(mint.clone().into_boxed_str()),
        )],
    });
    let h = Harness::build(config(), None, Some(resolver));
    h.provider.set(&[(1, 10)]);

    let outcome = h.service.trigger_refresh(SECRET, &pool).await.unwrap();
    assert_eq!(outcome.token_mint, mint);
    assert_eq!(outcome.pool_address.as_deref(), Some(pool.as_str()));

    let tracked = h.service.tracked();
    assert_eq!(tracked.token_mint.as_deref(), Some(mint.as_str()));
    assert_eq!(tracked.contract_address.as_deref(), Some(pool.as_str()));
}

#[tokio::test]
async fn set_tracked_address_broadcasts() {
    let h = Harness::new();
    let (_, mut rx) = h.service.subscribe();
    drain(&mut rx);

    let ca = addr(77);
    assert_eq!(h.service.set_tracked_address(SECRET, &ca).unwrap(), ca);

    let messages = drain(&mut rx);
    assert_eq!(kinds(&messages), vec![MessageType::CaUpdate]);
    assert_eq!(messages[0].data["contractAddress"], ca.as_str());

    // A later refresh of a plain mint keeps the operator's choice
    h.refresh(&[(1, 1)]).await;
    assert_eq!(h.service.tracked().contract_address.as_deref(), Some(ca.as_str()));
}

#[tokio::test]
async fn scheduled_refresh_respects_interval() {
    let h = Harness::new();
    assert!(h.service.run_scheduled_refresh().await.is_none());

    h.refresh(&[(1, 10), (2, 20)]).await;
    assert!(h.service.run_scheduled_refresh().await.is_none());
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);

    h.advance_interval();
    h.provider.set(&[(2, 20)]);
    let summary = h.service.run_scheduled_refresh().await.unwrap();
    assert_eq!(summary.new_sellers, vec![addr(1)]);
}

#[tokio::test]
async fn webhook_auth_header_enforced() {
    let mut cfg = config();
    cfg.auth.webhook_auth_header = Some("Bearer hook".to_string());
    let h = Harness::build(cfg, None, None);

    assert_eq!(
        h.service.ingest_transactions(None, &[]).unwrap_err(),
        HolderWatchError::Unauthorized
    );
    assert_eq!(
        h.service
            .ingest_transactions(Some("Bearer nope"), &[])
            .unwrap_err(),
        HolderWatchError::Unauthorized
    );
    assert!(h.service.ingest_transactions(Some("Bearer hook"), &[]).is_ok());
}
