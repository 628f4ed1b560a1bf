/// Birdeye token holder listing
///
/// Endpoint: GET /defi/token_holder?address={mint}&offset=0&limit={n}
/// Header `x-chain: solana`; `X-API-KEY` when a key is configured.
use async_trait::async_trait;
use serde_json::Value;

use super::client::ProviderClient;
use super::{first_str, first_u64, value_as_f64};
use crate::config::FetcherConfig;
use crate::errors::ProviderError;
use crate::holders::fetcher::HolderProvider;
use crate::holders::HolderRecord;

const BIRDEYE_BASE_URL: &str = "https://public-api.birdeye.so";
const PROVIDER: &str = "birdeye";
pub const RATE_LIMIT_PER_MINUTE: usize = 60;

/// Decimals assumed when an item does not carry its own
const DEFAULT_DECIMALS: i32 = 9;

pub struct BirdeyeProvider {
    client: ProviderClient,
    api_key: Option<String>,
    page_size: usize,
}

impl BirdeyeProvider {
    pub fn new(config: &FetcherConfig) -> Result<Self, String> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, RATE_LIMIT_PER_MINUTE, config.provider_timeout_secs)?,
            api_key: config.birdeye_api_key.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl HolderProvider for BirdeyeProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_holders(&self, mint: &str) -> Result<Vec<HolderRecord>, ProviderError> {
        let url = format!("{}/defi/token_holder", BIRDEYE_BASE_URL);
        let limit = self.page_size.to_string();
        let mut builder = self
            .client
            .http()
            .get(&url)
            .query(&[("address", mint), ("offset", "0"), ("limit", limit.as_str())])
            .header("Accept", "application/json")
            .header("x-chain", "solana");
        if let Some(key) = &self.api_key {
            builder = builder.header("X-API-KEY", key);
        }

        let body: Value = self.client.get_json("defi/token_holder", builder).await?;
        parse_holders(&body)
    }
}

/// Balance: `uiAmount * 10^decimals` when present, otherwise raw `amount`
fn item_balance(item: &Value) -> u64 {
    let decimals = item
        .get("decimals")
        .and_then(Value::as_i64)
        .map(|d| d as i32)
        .unwrap_or(DEFAULT_DECIMALS);

    let scaled = item
        .get("uiAmount")
        .and_then(value_as_f64)
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|ui| (ui * 10f64.powi(decimals)) as u64)
        .filter(|b| *b > 0);

    scaled
        .or_else(|| first_u64(item, &["amount"]))
        .unwrap_or(0)
}

/// Parse `data.items[]` into canonical records
pub fn parse_holders(body: &Value) -> Result<Vec<HolderRecord>, ProviderError> {
    let items = body
        .pointer("/data/items")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER,
            message: "missing data.items".to_string(),
        })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let address = first_str(item, &["owner", "holderAddress"])?;
            let balance = item_balance(item);
            let token_account = first_str(item, &["tokenAccount", "address"]).unwrap_or_default();
            (balance > 0).then(|| HolderRecord::new(address, balance, token_account))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scales_ui_amount() {
        let body = json!({
            "success": true,
            "data": { "items": [
                { "owner": "A", "uiAmount": 1.5, "decimals": 6, "tokenAccount": "ataA" },
                { "holderAddress": "B", "uiAmount": 2, "address": "ataB" },
                { "owner": "C", "amount": "777" },
                { "owner": "D", "uiAmount": 0, "amount": 0 },
                { "uiAmount": 5 }
            ]}
        });

        let holders = parse_holders(&body).unwrap();
        assert_eq!(
            holders,
            vec![
                HolderRecord::new("A", 1_500_000, "ataA"),
                HolderRecord::new("B", 2_000_000_000, "ataB"),
                HolderRecord::new("C", 777, ""),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        let err = parse_holders(&json!({"success": false, "message": "Unauthorized"})).unwrap_err();
        assert_eq!(err.provider(), "birdeye");
    }
}
