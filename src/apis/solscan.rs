/// Solscan token holder listings (legacy v1 and v2 endpoints)
///
/// - v1: GET https://api.solscan.io/token/holders?token=&offset=0&size=
/// - v2: GET https://api-v2.solscan.io/v2/token/holders?token=&page=1&page_size=
use async_trait::async_trait;
use serde_json::Value;

use super::client::ProviderClient;
use super::{first_str, first_u64};
use crate::config::FetcherConfig;
use crate::errors::ProviderError;
use crate::holders::fetcher::HolderProvider;
use crate::holders::HolderRecord;

const SOLSCAN_V1_URL: &str = "https://api.solscan.io/token/holders";
const SOLSCAN_V2_URL: &str = "https://api-v2.solscan.io/v2/token/holders";
const PROVIDER_V1: &str = "solscan";
const PROVIDER_V2: &str = "solscan_v2";
pub const RATE_LIMIT_PER_MINUTE: usize = 60;

// ============================================================================
// V1
// ============================================================================

pub struct SolscanProvider {
    client: ProviderClient,
    page_size: usize,
}

impl SolscanProvider {
    pub fn new(config: &FetcherConfig) -> Result<Self, String> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER_V1, RATE_LIMIT_PER_MINUTE, config.provider_timeout_secs)?,
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl HolderProvider for SolscanProvider {
    fn name(&self) -> &'static str {
        PROVIDER_V1
    }

    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError> {
        let size = self.page_size.to_string();
        let builder = self
            .client
            .http()
            .get(SOLSCAN_V1_URL)
            .query(&[("token", mint), ("offset", "0"), ("size", size.as_str())])
            .header("Accept", "application/json");

        let body: Value = self.client.get_json("token/holders", builder).await?;
        parse_v1_holders(&body)
    }
}

/// Parse v1 `data[]`: owner (or account) address, raw `amount`, account `address`
pub fn parse_v1_holders(body: &Value) -> Result<Vec<HolderRecord>, ProviderError> {
    let items = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER_V1,
            message: "missing data array".to_string(),
        })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let address = first_str(item, &["owner", "address"])?;
            let balance = first_u64(item, &["amount"])?;
            let token_account = first_str(item, &["address"]).unwrap_or_default();
            Some(HolderRecord::new(address, balance, token_account))
        })
        .collect())
}

// ============================================================================
// V2
// ============================================================================

pub struct SolscanV2Provider {
    client: ProviderClient,
    page_size: usize,
}

impl SolscanV2Provider {
    pub fn new(config: &FetcherConfig) -> Result<Self, String> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER_V2, RATE_LIMIT_PER_MINUTE, config.provider_timeout_secs)?,
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl HolderProvider for SolscanV2Provider {
    fn name(&self) -> &'static str {
        PROVIDER_V2
    }

    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError> {
        let page_size = self.page_size.to_string();
        let builder = self
            .client
            .http()
            .get(SOLSCAN_V2_URL)
            .query(&[("token", mint), ("page", "1"), ("page_size", page_size.as_str())])
            .header("Accept", "application/json");

        let body: Value = self.client.get_json("v2/token/holders", builder).await?;
        parse_v2_holders(&body)
    }
}

/// Parse v2 `data.items[]` or `data.result[]`
pub fn parse_v2_holders(body: &Value) -> Result<Vec<HolderRecord>, ProviderError> {
    let items = body
        .pointer("/data/items")
        .and_then(Value::as_array)
        .or_else(|| body.pointer("/data/result").and_then(Value::as_array))
        .ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER_V2,
            message: "missing data.items / data.result".to_string(),
        })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let address = first_str(item, &["owner", "address"])?;
            let balance = first_u64(item, &["amount", "balance"])?;
            let token_account = first_str(item, &["token_account", "address"]).unwrap_or_default();
            Some(HolderRecord::new(address, balance, token_account))
        })
        .collect())
}
