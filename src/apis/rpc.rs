/// Solana JSON-RPC largest-accounts fallback
///
/// `getTokenLargestAccounts` yields the top token accounts (max 20) with raw
/// amounts but no owners; a follow-up `getMultipleAccounts` with
/// `jsonParsed` encoding resolves each account's owner wallet.
use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::ProviderClient;
use super::{first_str, value_as_u64};
use crate::config::FetcherConfig;
use crate::errors::ProviderError;
use crate::holders::fetcher::HolderProvider;
use crate::holders::HolderRecord;

const PROVIDER: &str = "rpc";
pub const RATE_LIMIT_PER_MINUTE: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LargestAccount {
    pub address: String,
    pub amount: u64,
}

pub struct LargestAccountsProvider {
    client: ProviderClient,
    url: String,
}

impl LargestAccountsProvider {
    pub fn new(config: &FetcherConfig, url: String) -> Result<Self, String> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, RATE_LIMIT_PER_MINUTE, config.provider_timeout_secs)?,
            url,
        })
    }
}

#[async_trait]
impl HolderProvider for LargestAccountsProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError> {
        let largest = self
            .client
            .rpc_call(&self.url, "largest-accounts", "getTokenLargestAccounts", json!([mint]))
            .await?;
        let accounts = parse_largest_accounts(&largest)?;
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let addresses: Vec<&str> = accounts.iter().map(|a| a.address.as_str()).collect();
        let infos = self
            .client
            .rpc_call(
                &self.url,
                "get-accounts",
                "getMultipleAccounts",
                json!([addresses, { "encoding": "jsonParsed" }]),
            )
            .await?;

        join_owners(&accounts, &infos)
    }
}

/// Parse `value[]` of a getTokenLargestAccounts result
pub fn parse_largest_accounts(result: &Value) -> Result<Vec<LargestAccount>, ProviderError> {
    let values = result
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER,
            message: "missing value array".to_string(),
        })?;

    Ok(values
        .iter()
        .filter_map(|v| {
            Some(LargestAccount {
                address: first_str(v, &["address"])?.to_string(),
                amount: v.get("amount").and_then(value_as_u64)?,
            })
        })
        .collect())
}

/// Pair each largest account with the owner from the getMultipleAccounts result
///
/// The result is positional; accounts without a parsed owner are skipped.
pub fn join_owners(
    accounts: &[LargestAccount],
    infos: &Value,
) -> Result<Vec<HolderRecord>, ProviderError> {
    let values = infos
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER,
            message: "missing account infos".to_string(),
        })?;

    Ok(accounts
        .iter()
        .zip(values.iter())
        .filter_map(|(account, info)| {
            let owner = info
                .pointer("/data/parsed/info/owner")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())?;
            (account.amount > 0).then(|| HolderRecord::new(owner, account.amount, account.address.clone()))
        })
        .collect())
}
