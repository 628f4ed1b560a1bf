/// Holder service - single entry point for control operations, ingestion and subscription
///
/// Owns the ledger (plus the tracked mint / contract address) behind one
/// lock, the provider fetcher, the refresh scheduler and the broadcast hub.
///
/// Locking: the state mutex is never held across an await. Deltas are
/// published while it is held so subscribers observe ledger order, and new
/// subscribers register under it so INITIAL_STATE is never interleaved with a
/// delta it already contains. Lock order is state, then hub.
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

use super::events::{classify, WebhookTransaction};
use super::fetcher::{FetchResult, HolderFetcher};
use super::ledger::{IngestOutcome, Ledger, ReconcileSummary};
use super::projector::{self, StateView};
use super::scheduler::{ensure_not_refreshing, RefreshScheduler};
use super::types::{now_ms, AddressReport, HolderRecord};
use crate::broadcast::{BroadcastHub, Envelope, HubMetricsSnapshot, SubscriberId};
use crate::config::{AuthConfig, Config, LedgerConfig};
use crate::errors::{validate_address, HolderWatchError, Result};
use crate::logger::{self, LogTag};

/// Source of the current time in Unix ms
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Overrides for deterministic tests
#[derive(Default)]
pub struct ServiceOptions {
    pub rng: Option<StdRng>,
    pub clock: Option<Clock>,
}

struct TrackedState {
    ledger: Ledger,
    token_mint: Option<String>,
    contract_address: Option<String>,
}

/// Result of an explicit refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub holders_count: usize,
    pub holders: Vec<HolderRecord>,
    pub token_mint: String,
    pub pool_address: Option<String>,
    /// Unix ms
    pub next_refresh: i64,
    /// False when every provider came back empty and the ledger was left untouched
    pub ledger_updated: bool,
    pub provider: Option<&'static str>,
}

/// Result of one webhook delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub received: usize,
    /// Events that changed the ledger
    pub processed: usize,
    pub duplicates: usize,
    /// Not about the tracked mint, unattributable, or from an existing seller
    pub ignored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedRefs {
    pub token_mint: Option<String>,
    pub contract_address: Option<String>,
}

pub struct HolderService {
    state: Mutex<TrackedState>,
    fetcher: HolderFetcher,
    scheduler: RefreshScheduler,
    hub: BroadcastHub,
    ledger_config: LedgerConfig,
    auth: AuthConfig,
    clock: Clock,
}

impl HolderService {
    pub fn new(config: &Config, fetcher: HolderFetcher) -> Arc<Self> {
        Self::with_options(config, fetcher, ServiceOptions::default())
    }

    pub fn with_options(config: &Config, fetcher: HolderFetcher, options: ServiceOptions) -> Arc<Self> {
        let rng = options.rng.unwrap_or_else(StdRng::from_entropy);
        let clock: Clock = match options.clock {
            Some(clock) => clock,
            None => Arc::new(now_ms),
        };

        Arc::new(Self {
            state: Mutex::new(TrackedState {
                ledger: Ledger::with_rng(&config.ledger, rng),
                token_mint: None,
                contract_address: None,
            }),
            fetcher,
            scheduler: RefreshScheduler::new(config.refresh.interval_secs),
            hub: BroadcastHub::new(config.webserver.websocket.buffer_size),
            ledger_config: config.ledger.clone(),
            auth: config.auth.clone(),
            clock,
        })
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    /// Whether `password` matches the admin secret; an unset secret matches nothing
    pub fn verify_secret(&self, password: &str) -> bool {
        !self.auth.admin_secret.is_empty() && password == self.auth.admin_secret
    }

    fn authorize(&self, password: &str) -> Result<()> {
        if self.verify_secret(password) {
            Ok(())
        } else {
            Err(HolderWatchError::Unauthorized)
        }
    }

    fn authorize_webhook(&self, header: Option<&str>) -> Result<()> {
        match self.auth.webhook_auth_header.as_deref() {
            Some(expected) if header != Some(expected) => Err(HolderWatchError::Unauthorized),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------------

    /// Explicit operator refresh for a mint or pool address
    pub async fn trigger_refresh(self: &Arc<Self>, password: &str, address: &str) -> Result<RefreshOutcome> {
        self.authorize(password)?;
        let address = address.trim();
        validate_address("mintAddress", address)?;

        self.scheduler.check_manual(self.now())?;
        let _guard = ensure_not_refreshing(&self.scheduler)?;

        logger::info(LogTag::Scheduler, &format!("Refresh requested for {}", address));
        let result = self.fetcher.fetch(address).await;

        let now = self.now();
        self.scheduler.mark_refreshed(now);
        let ledger_updated = self.apply_snapshot(&result, now, true).is_some();
        self.arm_auto_refresh();

        let holders_count = result.holders.len();
        let mut holders = result.holders;
        holders.truncate(self.ledger_config.list_cap);

        Ok(RefreshOutcome {
            holders_count,
            holders,
            token_mint: result.token_mint,
            pool_address: result.pool_address,
            next_refresh: now.saturating_add(self.scheduler.interval_ms()),
            ledger_updated,
            provider: result.report.winner(),
        })
    }

    /// Periodic tick; silently skips when nothing is tracked, the interval has
    /// not elapsed, or another refresh is running
    pub async fn run_scheduled_refresh(&self) -> Option<ReconcileSummary> {
        let mint = self.state.lock().token_mint.clone()?;

        if !self.scheduler.is_due(self.now()) {
            logger::debug(LogTag::Scheduler, "Skipping tick, refreshed recently");
            return None;
        }
        let Some(_guard) = self.scheduler.try_begin() else {
            logger::debug(LogTag::Scheduler, "Skipping tick, refresh already in flight");
            return None;
        };

        logger::info(LogTag::Scheduler, &format!("Auto-refreshing holders for {}", mint));
        let result = self.fetcher.fetch(&mint).await;

        let now = self.now();
        self.scheduler.mark_refreshed(now);
        self.apply_snapshot(&result, now, false)
    }

    /// Reconcile a non-empty fetch result, optionally updating tracked references
    ///
    /// An empty result leaves the ledger untouched and returns None.
    fn apply_snapshot(&self, result: &FetchResult, now: i64, update_refs: bool) -> Option<ReconcileSummary> {
        if result.holders.is_empty() {
            self.log_empty(result);
            return None;
        }

        let mut state = self.state.lock();
        let summary = state.ledger.reconcile(&result.token_mint, &result.holders, now);
        if summary.asset_changed {
            logger::info(
                LogTag::Ledger,
                &format!("Tracked asset changed to {}, ledger reset", result.token_mint),
            );
        }
        logger::info(
            LogTag::Ledger,
            &format!(
                "Reconciled {} holders ({} new sellers, {} sellers skipped)",
                summary.holders,
                summary.new_sellers.len(),
                summary.skipped_sellers
            ),
        );
        self.publish_lists(&state.ledger);

        if update_refs {
            let previous_mint = state.token_mint.replace(result.token_mint.clone());
            let new_ca = match (&result.pool_address, &state.contract_address) {
                (Some(pool), _) => Some(pool.clone()),
                (None, None) => Some(result.token_mint.clone()),
                // Follow the mint when the address was never set to anything else
                (None, Some(current)) if Some(current) == previous_mint.as_ref() => {
                    Some(result.token_mint.clone())
                }
                _ => None,
            };

            if let Some(ca) = new_ca {
                if state.contract_address.as_deref() != Some(ca.as_str()) {
                    self.hub.publish(&Envelope::ca_update(&ca));
                    state.contract_address = Some(ca);
                }
            }
        }

        Some(summary)
    }

    fn log_empty(&self, result: &FetchResult) {
        let err = HolderWatchError::EmptyResult {
            asset: result.token_mint.clone(),
        };
        logger::warning(
            LogTag::Fetcher,
            &format!("{}; ledger left unchanged ({} attempts)", err, result.report.attempts.len()),
        );
    }

    fn publish_lists(&self, ledger: &Ledger) {
        let lists = projector::lists(ledger, &self.ledger_config);
        self.hub.publish(&Envelope::lists(&lists));
        self.hub.publish(&Envelope::stats(&projector::stats(ledger)));
    }

    /// (Re)start the periodic refresh task; exactly one is ever live
    fn arm_auto_refresh(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = Duration::from_millis(self.scheduler.interval_ms().max(1) as u64);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(service) => {
                        service.run_scheduled_refresh().await;
                    }
                    None => break,
                }
            }
        });

        self.scheduler.arm(handle);
        logger::debug(
            LogTag::Scheduler,
            &format!("Auto-refresh armed (every {}s)", period.as_secs()),
        );
    }

    pub fn last_refresh(&self) -> Option<i64> {
        self.scheduler.last_refresh()
    }

    pub fn next_refresh(&self) -> Option<i64> {
        self.scheduler.next_allowed()
    }

    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_refreshing()
    }

    // ------------------------------------------------------------------------
    // Tracked references
    // ------------------------------------------------------------------------

    /// Set the contract address shown to viewers
    pub fn set_tracked_address(&self, password: &str, contract_address: &str) -> Result<String> {
        self.authorize(password)?;
        let contract_address = contract_address.trim();
        validate_address("contractAddress", contract_address)?;

        let mut state = self.state.lock();
        state.contract_address = Some(contract_address.to_string());
        self.hub.publish(&Envelope::ca_update(contract_address));

        logger::info(
            LogTag::Ledger,
            &format!("Contract address updated: {}", contract_address),
        );
        Ok(contract_address.to_string())
    }

    pub fn tracked(&self) -> TrackedRefs {
        let state = self.state.lock();
        TrackedRefs {
            token_mint: state.token_mint.clone(),
            contract_address: state.contract_address.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------------

    /// Apply a raw webhook delivery, decoding each entry on its own
    ///
    /// Entries that fail to decode are logged and counted as ignored; the rest
    /// of the batch still applies.
    pub fn ingest_payload(
        &self,
        auth_header: Option<&str>,
        entries: Vec<serde_json::Value>,
    ) -> Result<IngestReport> {
        self.authorize_webhook(auth_header)?;

        let received = entries.len();
        let mut transactions = Vec::with_capacity(received);
        for (index, entry) in entries.into_iter().enumerate() {
            match WebhookTransaction::from_value(entry) {
                Ok(tx) => transactions.push(tx),
                Err(e) => logger::warning(
                    LogTag::Ingest,
                    &format!("Skipping undecodable webhook entry #{}: {}", index, e),
                ),
            }
        }

        let mut report = self.apply_transactions(&transactions);
        report.received = received;
        report.ignored += received - transactions.len();
        Ok(report)
    }

    /// Apply a decoded webhook delivery
    pub fn ingest_transactions(
        &self,
        auth_header: Option<&str>,
        transactions: &[WebhookTransaction],
    ) -> Result<IngestReport> {
        self.authorize_webhook(auth_header)?;
        Ok(self.apply_transactions(transactions))
    }

    fn apply_transactions(&self, transactions: &[WebhookTransaction]) -> IngestReport {
        let mut report = IngestReport {
            received: transactions.len(),
            ..IngestReport::default()
        };

        let now = self.now();
        let mut state = self.state.lock();
        let Some(mint) = state.token_mint.clone() else {
            report.ignored = transactions.len();
            logger::debug(LogTag::Ingest, "No tracked mint, webhook delivery ignored");
            return report;
        };

        for tx in transactions {
            let Some(event) = classify(tx, &mint, now) else {
                report.ignored += 1;
                continue;
            };

            let outcome = state.ledger.apply_event(&event);
            match &outcome {
                IngestOutcome::Duplicate => {
                    report.duplicates += 1;
                    logger::debug(
                        LogTag::Ingest,
                        &format!("Duplicate signature {:?} dropped", event.signature),
                    );
                }
                IngestOutcome::AlreadySeller => report.ignored += 1,
                IngestOutcome::Sold { seller, activity } => {
                    logger::info(
                        LogTag::Ingest,
                        &format!("SELL {} amount={} [{}]", seller.address, event.amount, seller.shame),
                    );
                    self.hub.publish(&Envelope::sell(
                        &seller.address,
                        event.amount,
                        event.signature.as_deref(),
                        seller.shame,
                    ));
                    self.hub.publish(&Envelope::activity(activity));
                }
                IngestOutcome::Bought { holder, activity } => {
                    logger::info(
                        LogTag::Ingest,
                        &format!(
                            "BUY {} amount={}{}",
                            event.wallet,
                            event.amount,
                            if holder.is_none() { " (seller, not reinstated)" } else { "" }
                        ),
                    );
                    self.hub.publish(&Envelope::buy(
                        &event.wallet,
                        event.amount,
                        event.signature.as_deref(),
                    ));
                    self.hub.publish(&Envelope::activity(activity));
                }
            }

            if outcome.changed_ledger() {
                report.processed += 1;
                self.publish_lists(&state.ledger);
            }
        }

        report
    }

    // ------------------------------------------------------------------------
    // Queries and subscription
    // ------------------------------------------------------------------------

    pub fn query_address(&self, address: &str) -> Result<AddressReport> {
        let address = address.trim();
        validate_address("address", address)?;
        Ok(self.state.lock().ledger.query(address))
    }

    /// Full state with `api_activity` activity entries
    pub fn state_view(&self) -> StateView {
        let state = self.state.lock();
        self.view(&state, self.ledger_config.api_activity)
    }

    fn view(&self, state: &TrackedState, activity_cap: usize) -> StateView {
        projector::state_view(
            &state.ledger,
            &self.ledger_config,
            activity_cap,
            state.contract_address.clone(),
            state.token_mint.clone(),
        )
    }

    /// Register a subscriber; its queue starts with INITIAL_STATE
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<Envelope>) {
        let state = self.state.lock();
        let view = self.view(&state, self.ledger_config.initial_activity);
        self.hub.subscribe(Envelope::initial_state(&view))
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.hub.unsubscribe(id);
    }

    pub fn hub_metrics(&self) -> HubMetricsSnapshot {
        self.hub.metrics()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.fetcher.provider_names()
    }
}
