/// External holder data providers
///
/// Each provider module exposes a client implementing one of the fetcher
/// capability traits plus a pure `parse_*` function for its response shape.
pub mod birdeye;
pub mod client;
pub mod geckoterminal;
pub mod helius;
pub mod rpc;
pub mod solscan;

pub use birdeye::BirdeyeProvider;
pub use client::{ProviderClient, RateLimiter};
pub use geckoterminal::GeckoTerminalResolver;
pub use helius::HeliusProvider;
pub use rpc::LargestAccountsProvider;
pub use solscan::{SolscanProvider, SolscanV2Provider};

use serde_json::Value;

/// Integer from a JSON number or numeric string (fractions truncated)
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    }
}

/// Float from a JSON number or numeric string
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// First non-empty string among `keys`
pub(crate) fn first_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// First positive integer among `keys`
pub(crate) fn first_u64(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(value_as_u64))
        .find(|n| *n > 0)
}
