/// Helius DAS `getTokenAccounts`
///
/// Only registered when an API key is configured.
use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::ProviderClient;
use super::{first_str, first_u64};
use crate::config::FetcherConfig;
use crate::errors::ProviderError;
use crate::holders::fetcher::HolderProvider;
use crate::holders::HolderRecord;

const HELIUS_RPC_URL: &str = "https://mainnet.helius-rpc.com";
const PROVIDER: &str = "helius";
pub const RATE_LIMIT_PER_MINUTE: usize = 120;

/// RPC endpoint for a Helius API key
pub fn rpc_url(api_key: &str) -> String {
    format!("{}/?api-key={}", HELIUS_RPC_URL, api_key)
}

pub struct HeliusProvider {
    client: ProviderClient,
    url: String,
    limit: usize,
}

impl HeliusProvider {
    pub fn new(config: &FetcherConfig, api_key: &str) -> Result<Self, String> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, RATE_LIMIT_PER_MINUTE, config.provider_timeout_secs)?,
            url: rpc_url(api_key),
            limit: config.helius_limit,
        })
    }
}

#[async_trait]
impl HolderProvider for HeliusProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError> {
        let result = self
            .client
            .rpc_call(
                &self.url,
                "holder-fetch",
                "getTokenAccounts",
                json!({ "mint": mint, "limit": self.limit }),
            )
            .await?;
        parse_token_accounts(&result)
    }
}

/// Parse `token_accounts[]` from a getTokenAccounts result
pub fn parse_token_accounts(result: &Value) -> Result<Vec<HolderRecord>, ProviderError> {
    let accounts = result
        .get("token_accounts")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER,
            message: "missing token_accounts".to_string(),
        })?;

    Ok(accounts
        .iter()
        .filter_map(|account| {
            let owner = first_str(account, &["owner"])?;
            let amount = first_u64(account, &["amount"])?;
            let token_account = first_str(account, &["address"]).unwrap_or_default();
            Some(HolderRecord::new(owner, amount, token_account))
        })
        .collect())
}
