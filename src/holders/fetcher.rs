/// Provider fallback fetcher
///
/// Resolves a tracked address to a holder snapshot:
/// 1. optional pool lookup (a pool address is swapped for its base mint)
/// 2. ordered provider chain, first non-empty valid result wins
///
/// Provider failures never escape: each attempt is timed out, logged and
/// recorded in the [`FetchReport`]. Exhausting the chain yields an empty list.
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::HolderRecord;
use crate::apis::{
    helius, BirdeyeProvider, GeckoTerminalResolver, HeliusProvider, LargestAccountsProvider,
    SolscanProvider, SolscanV2Provider,
};
use crate::config::FetcherConfig;
use crate::errors::ProviderError;
use crate::logger::{self, LogTag};

// ============================================================================
// CAPABILITY TRAITS
// ============================================================================

/// A source of holder snapshots for a mint
#[async_trait]
pub trait HolderProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError>;
}

/// Maps a pool address to its base token mint
#[async_trait]
pub trait PoolResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the address is not a known pool
    async fn resolve_pool(&self, address: &str) -> Result<Option<String>, ProviderError>;
}

// ============================================================================
// REPORTING
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Non-empty valid result (count after filtering)
    Holders(usize),
    Empty,
    Failed(ProviderError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAttempt {
    pub provider: &'static str,
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u64,
}

/// Every attempt made during one fetch, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub pool_lookup_error: Option<ProviderError>,
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchReport {
    /// Provider whose result was used
    pub fn winner(&self) -> Option<&'static str> {
        self.attempts
            .iter()
            .find(|a| matches!(a.outcome, AttemptOutcome::Holders(_)))
            .map(|a| a.provider)
    }

    pub fn failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Failed(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// Sorted by balance descending; empty when every provider failed
    pub holders: Vec<HolderRecord>,
    /// Asset id the chain ran with
    pub token_mint: String,
    /// Input address when it resolved as a pool
    pub pool_address: Option<String>,
    pub report: FetchReport,
}

// ============================================================================
// FETCHER
// ============================================================================

pub struct HolderFetcher {
    resolver: Option<Arc<dyn PoolResolver>>,
    providers: Vec<Arc<dyn HolderProvider>>,
    timeout: Duration,
}

impl HolderFetcher {
    pub fn new(
        resolver: Option<Arc<dyn PoolResolver>>,
        providers: Vec<Arc<dyn HolderProvider>>,
        timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            providers,
            timeout,
        }
    }

    /// Build the production chain from configuration
    pub fn from_config(config: &FetcherConfig) -> Result<Self, String> {
        let resolver: Option<Arc<dyn PoolResolver>> = if config.pool_resolution_enabled {
            Some(Arc::new(GeckoTerminalResolver::new(config)?))
        } else {
            None
        };

        let mut providers: Vec<Arc<dyn HolderProvider>> = Vec::new();
        if config.birdeye_enabled {
            providers.push(Arc::new(BirdeyeProvider::new(config)?));
        }
        if config.solscan_enabled {
            providers.push(Arc::new(SolscanProvider::new(config)?));
        }
        if config.solscan_v2_enabled {
            providers.push(Arc::new(SolscanV2Provider::new(config)?));
        }

        let helius_key = config
            .helius_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty());
        if let Some(key) = helius_key {
            providers.push(Arc::new(HeliusProvider::new(config, key)?));
        }
        if config.rpc_fallback_enabled {
            let url = helius_key
                .map(helius::rpc_url)
                .unwrap_or_else(|| config.rpc_url.clone());
            providers.push(Arc::new(LargestAccountsProvider::new(config, url)?));
        }

        if providers.is_empty() {
            return Err("no holder providers enabled".to_string());
        }

        Ok(Self::new(
            resolver,
            providers,
            Duration::from_secs(config.provider_timeout_secs),
        ))
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    async fn resolve_pool(&self, address: &str, report: &mut FetchReport) -> Option<String> {
        let resolver = self.resolver.as_ref()?;

        let result = match tokio::time::timeout(self.timeout, resolver.resolve_pool(address)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: resolver.name(),
                timeout_ms: self.timeout_ms(),
            }),
        };

        match result {
            Ok(mint) => mint.filter(|m| m != address),
            Err(e) => {
                logger::debug(
                    LogTag::Fetcher,
                    &format!("Pool lookup for {} failed, treating as mint: {}", address, e),
                );
                report.pool_lookup_error = Some(e);
                None
            }
        }
    }

    async fn attempt(&self, provider: &dyn HolderProvider, mint: &str) -> (AttemptOutcome, Vec<HolderRecord>) {
        let result = match tokio::time::timeout(self.timeout, provider.fetch_holders(mint)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: provider.name(),
                timeout_ms: self.timeout_ms(),
            }),
        };

        match result {
            Ok(records) => {
                let holders = normalize(records);
                if holders.is_empty() {
                    (AttemptOutcome::Empty, holders)
                } else {
                    (AttemptOutcome::Holders(holders.len()), holders)
                }
            }
            Err(e) => (AttemptOutcome::Failed(e), Vec::new()),
        }
    }

    /// Run the chain for `address` (mint or pool)
    pub async fn fetch(&self, address: &str) -> FetchResult {
        let mut report = FetchReport::default();

        let (token_mint, pool_address) = match self.resolve_pool(address, &mut report).await {
            Some(mint) => (mint, Some(address.to_string())),
            None => (address.to_string(), None),
        };

        let mut holders = Vec::new();
        for provider in &self.providers {
            let start = Instant::now();
            let (outcome, records) = self.attempt(provider.as_ref(), &token_mint).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &outcome {
                AttemptOutcome::Holders(count) => logger::info(
                    LogTag::Fetcher,
                    &format!("{} found {} holders for {} ({}ms)", provider.name(), count, token_mint, elapsed_ms),
                ),
                AttemptOutcome::Empty => logger::debug(
                    LogTag::Fetcher,
                    &format!("{} returned no holders for {}", provider.name(), token_mint),
                ),
                AttemptOutcome::Failed(e) => {
                    logger::warning(LogTag::Fetcher, &format!("Provider failed: {}", e))
                }
            }

            let done = matches!(outcome, AttemptOutcome::Holders(_));
            report.attempts.push(ProviderAttempt {
                provider: provider.name(),
                outcome,
                elapsed_ms,
            });

            if done {
                holders = records;
                break;
            }
        }

        if holders.is_empty() {
            logger::warning(
                LogTag::Fetcher,
                &format!(
                    "All {} providers exhausted for {} ({} failed)",
                    report.attempts.len(),
                    token_mint,
                    report.failures()
                ),
            );
        }

        FetchResult {
            holders,
            token_mint,
            pool_address,
            report,
        }
    }
}

/// Drop empty addresses and zero balances, then sort by balance descending
fn normalize(records: Vec<HolderRecord>) -> Vec<HolderRecord> {
    let mut holders: Vec<HolderRecord> = records
        .into_iter()
        .filter(|r| r.balance > 0 && !r.address.trim().is_empty())
        .collect();
    holders.sort_by(|a, b| b.balance.cmp(&a.balance).then_with(|| a.address.cmp(&b.address)));
    holders
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory provider returning a fixed result
    pub struct FakeProvider {
        pub name: &'static str,
        pub result: Result<Vec<HolderRecord>, ProviderError>,
        pub delay: Option<Duration>,
        pub calls: AtomicUsize,
        pub last_mint: parking_lot::Mutex<Option<String>>,
    }

    impl FakeProvider {
        pub fn ok(name: &'static str, holders: Vec<HolderRecord>) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(holders),
                delay: None,
                calls: AtomicUsize::new(0),
                last_mint: parking_lot::Mutex::new(None),
            })
        }

        pub fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Err(ProviderError::HttpStatus {
                    provider: name,
                    status: 500,
                    body: "boom".to_string(),
                }),
                delay: None,
                calls: AtomicUsize::new(0),
                last_mint: parking_lot::Mutex::new(None),
            })
        }

        pub fn slow(name: &'static str, delay: Duration, holders: Vec<HolderRecord>) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(holders),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
                last_mint: parking_lot::Mutex::new(None),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HolderProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_mint.lock() = Some(mint.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    pub struct FakeResolver {
        pub pools: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl PoolResolver for FakeResolver {
        fn name(&self) -> &'static str {
            "fake_pools"
        }

        async fn resolve_pool(&self, address: &str) -> Result<Option<String>, ProviderError> {
            Ok(self
                .pools
                .iter()
                .find(|(pool, _)| *pool == address)
                .map(|(_, mint)| mint.to_string()))
        }
    }

    pub fn chain(providers: &[Arc<FakeProvider>]) -> Vec<Arc<dyn HolderProvider>> {
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn HolderProvider>)
            .collect()
    }

    fn fetcher(providers: &[Arc<FakeProvider>]) -> HolderFetcher {
        HolderFetcher::new(None, chain(providers), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_failing_provider_is_skipped() {
        let first = FakeProvider::failing("first");
        let second = FakeProvider::ok("second", vec![HolderRecord::new("A", 10, "a")]);
        let third = FakeProvider::ok("third", vec![HolderRecord::new("B", 99, "b")]);

        let result = fetcher(&[first.clone(), second.clone(), third.clone()])
            .fetch("Mint")
            .await;

        assert_eq!(result.holders, vec![HolderRecord::new("A", 10, "a")]);
        assert_eq!(result.report.winner(), Some("second"));
        assert_eq!(result.report.failures(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_result_falls_through() {
        let empty = FakeProvider::ok("empty", vec![HolderRecord::new("Z", 0, "z")]);
        let full = FakeProvider::ok("full", vec![HolderRecord::new("A", 1, "a")]);

        let result = fetcher(&[empty, full]).fetch("Mint").await;
        assert_eq!(result.report.attempts[0].outcome, AttemptOutcome::Empty);
        assert_eq!(result.report.winner(), Some("full"));
    }

    #[tokio::test]
    async fn test_all_failing_returns_empty() {
        let result = fetcher(&[FakeProvider::failing("a"), FakeProvider::failing("b")])
            .fetch("Mint")
            .await;

        assert!(result.holders.is_empty());
        assert_eq!(result.token_mint, "Mint");
        assert_eq!(result.report.failures(), 2);
        assert_eq!(result.report.winner(), None);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let slow = FakeProvider::slow("slow", Duration::from_secs(30), vec![HolderRecord::new("A", 1, "")]);
        let fast = FakeProvider::ok("fast", vec![HolderRecord::new("B", 2, "")]);
        let fetcher = HolderFetcher::new(None, chain(&[slow, fast]), Duration::from_millis(50));

        let result = fetcher.fetch("Mint").await;
        assert!(matches!(
            result.report.attempts[0].outcome,
            AttemptOutcome::Failed(ProviderError::Timeout { provider: "slow", .. })
        ));
        assert_eq!(result.report.winner(), Some("fast"));
    }

    #[tokio::test]
    async fn test_pool_input_runs_on_resolved_mint() {
        let provider = FakeProvider::ok("p", vec![HolderRecord::new("A", 1, "")]);
        let fetcher = HolderFetcher::new(
            Some(Arc::new(FakeResolver {
                pools: vec![("PoolAddr", "BaseMint")],
            }) as Arc<dyn PoolResolver>),
            chain(&[provider.clone()]),
            Duration::from_secs(5),
        );

        let result = fetcher.fetch("PoolAddr").await;
        assert_eq!(result.token_mint, "BaseMint");
        assert_eq!(result.pool_address.as_deref(), Some("PoolAddr"));
        assert_eq!(provider.last_mint.lock().as_deref(), Some("BaseMint"));

        let direct = fetcher.fetch("SomeMint").await;
        assert_eq!(direct.token_mint, "SomeMint");
        assert_eq!(direct.pool_address, None);
    }

    #[tokio::test]
    async fn test_result_sorted_and_filtered() {
        let provider = FakeProvider::ok(
            "p",
            vec![
                HolderRecord::new("small", 5, ""),
                HolderRecord::new("", 100, ""),
                HolderRecord::new("zero", 0, ""),
                HolderRecord::new("big", 50, ""),
            ],
        );

        let result = fetcher(&[provider]).fetch("Mint").await;
        let order: Vec<_> = result.holders.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(order, vec!["big", "small"]);
    }

    #[test]
    fn test_from_config_chain_order() {
        let config = FetcherConfig {
            helius_api_key: Some("key".to_string()),
            ..FetcherConfig::default()
        };
        let fetcher = HolderFetcher::from_config(&config).unwrap();
        assert_eq!(
            fetcher.provider_names(),
            vec!["birdeye", "solscan", "solscan_v2", "helius", "rpc"]
        );

        let minimal = FetcherConfig {
            birdeye_enabled: false,
            solscan_enabled: false,
            solscan_v2_enabled: false,
            ..FetcherConfig::default()
        };
        assert_eq!(HolderFetcher::from_config(&minimal).unwrap().provider_names(), vec!["rpc"]);

        let none = FetcherConfig {
            rpc_fallback_enabled: false,
            ..minimal
        };
        assert!(HolderFetcher::from_config(&none).is_err());
    }
}
