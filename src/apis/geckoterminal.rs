/// GeckoTerminal pool lookup
///
/// API Documentation: https://www.geckoterminal.com/dex-api
///
/// Only /networks/{network}/pools/{address} is used: when the address is a
/// pool, its base token relationship names the mint to track.
use async_trait::async_trait;
use serde::Deserialize;

use super::client::ProviderClient;
use crate::config::FetcherConfig;
use crate::errors::ProviderError;
use crate::holders::fetcher::PoolResolver;
use crate::logger::{self, LogTag};

const GECKOTERMINAL_BASE_URL: &str = "https://api.geckoterminal.com/api/v2";

/// Default network for Solana operations
const DEFAULT_NETWORK: &str = "solana";

const PROVIDER: &str = "geckoterminal";

/// Rate limit per minute - GeckoTerminal has strict limits, 30/min is safe
pub const RATE_LIMIT_PER_MINUTE: usize = 30;

#[derive(Debug, Deserialize)]
pub struct PoolResponse {
    pub data: Option<PoolData>,
}

#[derive(Debug, Deserialize)]
pub struct PoolData {
    pub id: Option<String>,
    pub relationships: Option<PoolRelationships>,
}

#[derive(Debug, Deserialize)]
pub struct PoolRelationships {
    pub base_token: Option<RelationshipRef>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipRef {
    pub data: Option<RelationshipData>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipData {
    pub id: String,
}

impl PoolResponse {
    /// Base token mint with the `solana_` network prefix stripped
    pub fn base_token_mint(&self) -> Option<String> {
        let id = &self
            .data
            .as_ref()?
            .relationships
            .as_ref()?
            .base_token
            .as_ref()?
            .data
            .as_ref()?
            .id;

        let prefix = format!("{}_", DEFAULT_NETWORK);
        let mint = id.strip_prefix(prefix.as_str()).unwrap_or(id);
        (!mint.is_empty()).then(|| mint.to_string())
    }
}

pub struct GeckoTerminalResolver {
    client: ProviderClient,
}

impl GeckoTerminalResolver {
    pub fn new(config: &FetcherConfig) -> Result<Self, String> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, RATE_LIMIT_PER_MINUTE, config.provider_timeout_secs)?,
        })
    }
}

#[async_trait]
impl PoolResolver for GeckoTerminalResolver {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn resolve_pool(&self, address: &str) -> Result<Option<String>, ProviderError> {
        let endpoint = format!("networks/{}/pools/{}", DEFAULT_NETWORK, address);
        let url = format!("{}/{}", GECKOTERMINAL_BASE_URL, endpoint);
        let builder = self
            .client
            .http()
            .get(&url)
            .header("Accept", "application/json");

        match self.client.get_json::<PoolResponse>(&endpoint, builder).await {
            Ok(response) => {
                let mint = response.base_token_mint();
                if let Some(mint) = &mint {
                    logger::info(
                        LogTag::Fetcher,
                        &format!("{} is a pool, base token mint {}", address, mint),
                    );
                }
                Ok(mint)
            }
            // Unknown pool: the address is treated as a mint
            Err(ProviderError::HttpStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_token_mint_strips_prefix() {
        let response: PoolResponse = serde_json::from_value(json!({
            "data": {
                "id": "solana_Pool111",
                "type": "pool",
                "attributes": { "name": "X / SOL" },
                "relationships": {
                    "base_token": { "data": { "id": "solana_Mint111", "type": "token" } },
                    "quote_token": { "data": { "id": "solana_So11111111111111111111111111111111111111112" } }
                }
            }
        }))
        .unwrap();

        assert_eq!(response.base_token_mint().as_deref(), Some("Mint111"));
    }

    #[test]
    fn test_base_token_mint_absent() {
        let response: PoolResponse =
            serde_json::from_value(json!({ "data": { "id": "x", "relationships": {} } })).unwrap();
        assert_eq!(response.base_token_mint(), None);

        let empty: PoolResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.base_token_mint(), None);
    }
}
