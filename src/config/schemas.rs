/// Configuration schemas - all config structures defined once with defaults
use crate::config_struct;

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// Subscriber WebSocket settings
    pub struct WebSocketConfig {
        /// Per-subscriber queue length; a full queue drops messages for that subscriber
        buffer_size: usize = 256,
        /// Server ping interval
        heartbeat_secs: u64 = 30,
        /// Close connections that show no activity for this long
        idle_timeout_secs: u64 = 120,
        /// Grace period for a pong after a server ping
        pong_timeout_secs: u64 = 10,
    }
}

config_struct! {
    /// HTTP/WebSocket server configuration
    pub struct WebserverConfig {
        host: String = "0.0.0.0".to_string(),
        port: u16 = 3000,
        websocket: WebSocketConfig = WebSocketConfig::default(),
    }
}

// ============================================================================
// FETCHER CONFIGURATION
// ============================================================================

config_struct! {
    /// Holder snapshot provider chain configuration
    pub struct FetcherConfig {
        /// Timeout applied to every individual provider call
        provider_timeout_secs: u64 = 10,

        /// Holders requested per listing API call
        page_size: usize = 100,

        /// Try GeckoTerminal pool lookup before the chain
        pool_resolution_enabled: bool = true,

        birdeye_enabled: bool = true,
        birdeye_api_key: Option<String> = None,

        solscan_enabled: bool = true,
        solscan_v2_enabled: bool = true,

        /// Helius DAS getTokenAccounts; only used when an API key is present
        helius_api_key: Option<String> = None,
        helius_limit: usize = 1000,

        /// Public RPC used for the largest-accounts fallback when no Helius key is set
        rpc_url: String = "https://api.mainnet-beta.solana.com".to_string(),
        rpc_fallback_enabled: bool = true,
    }
}

// ============================================================================
// REFRESH CONFIGURATION
// ============================================================================

config_struct! {
    /// Snapshot refresh scheduling
    pub struct RefreshConfig {
        /// Minimum spacing between refreshes, also the auto-refresh period
        interval_secs: u64 = 180,
    }
}

// ============================================================================
// LEDGER CONFIGURATION
// ============================================================================

config_struct! {
    /// Ledger and projection limits
    pub struct LedgerConfig {
        /// Activity feed length kept in memory
        activity_cap: usize = 100,

        /// Entries per list sent over the wire
        list_cap: usize = 100,

        /// Activity entries included in INITIAL_STATE
        initial_activity: usize = 20,

        /// Activity entries returned by GET /api/state
        api_activity: usize = 50,

        /// points = floor(balance / points_divisor)
        points_divisor: u64 = 1_000_000,

        /// Drop webhook notifications whose signature was already applied
        dedupe_signatures: bool = true,
        dedupe_capacity: usize = 10_000,
    }
}

// ============================================================================
// AUTH CONFIGURATION
// ============================================================================

config_struct! {
    /// Credentials for control operations and the webhook
    pub struct AuthConfig {
        /// Shared secret for control operations; empty rejects every control request
        admin_secret: String = String::new(),

        /// Expected Authorization header on webhook deliveries (None accepts any)
        webhook_auth_header: Option<String> = None,
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration structure containing all sub-configurations
    pub struct Config {
        webserver: WebserverConfig = WebserverConfig::default(),
        fetcher: FetcherConfig = FetcherConfig::default(),
        refresh: RefreshConfig = RefreshConfig::default(),
        ledger: LedgerConfig = LedgerConfig::default(),
        auth: AuthConfig = AuthConfig::default(),
    }
}

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

impl WebserverConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.webserver.host.is_empty() {
            return Err("webserver.host cannot be empty".to_string());
        }
        if self.webserver.websocket.buffer_size == 0 {
            return Err("webserver.websocket.buffer_size must be > 0".to_string());
        }
        if self.webserver.websocket.heartbeat_secs == 0 {
            return Err("webserver.websocket.heartbeat_secs must be > 0".to_string());
        }
        if self.fetcher.provider_timeout_secs == 0 {
            return Err("fetcher.provider_timeout_secs must be > 0".to_string());
        }
        if self.fetcher.page_size == 0 {
            return Err("fetcher.page_size must be > 0".to_string());
        }
        if self.fetcher.rpc_fallback_enabled {
            let parsed = url::Url::parse(&self.fetcher.rpc_url)
                .map_err(|e| format!("fetcher.rpc_url is not a valid URL: {}", e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("fetcher.rpc_url must be http(s), got {}", parsed.scheme()));
            }
        }
        if self.refresh.interval_secs == 0 {
            return Err("refresh.interval_secs must be > 0".to_string());
        }
        if self.ledger.activity_cap == 0 {
            return Err("ledger.activity_cap must be > 0".to_string());
        }
        if self.ledger.points_divisor == 0 {
            return Err("ledger.points_divisor must be > 0".to_string());
        }
        if self.ledger.dedupe_signatures && self.ledger.dedupe_capacity == 0 {
            return Err("ledger.dedupe_capacity must be > 0 when dedupe is enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_rpc_url() {
        let mut config = Config::default();
        config.fetcher.rpc_url = "not a url".to_string();
        assert!(config.validate().unwrap_err().contains("rpc_url"));

        config.fetcher.rpc_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        // Ignored when the fallback is off
        config.fetcher.rpc_fallback_enabled = false;
        assert!(config.validate().is_ok());
    }
}
