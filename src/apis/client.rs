/// Base HTTP client with rate limiting, shared by every holder data provider
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::errors::ProviderError;
use crate::logger::{self, LogTag};

/// Rate limiter for API clients
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
    max_per_minute: usize,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        let min_interval = if max_per_minute > 0 {
            Duration::from_secs_f64(60.0 / max_per_minute as f64)
        } else {
            Duration::ZERO
        };

        Self {
            semaphore: Arc::new(Semaphore::new(1)), // Only 1 concurrent request
            last_request: Arc::new(Mutex::new(None)),
            min_interval,
            max_per_minute,
        }
    }

    /// Wait until we can make a request (respects rate limits)
    pub async fn acquire(&self) -> Result<RateLimitGuard, String> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| format!("Failed to acquire rate limiter permit: {}", e))?;

        if !self.min_interval.is_zero() {
            let mut last = self.last_request.lock().await;
            if let Some(last_time) = *last {
                let elapsed = last_time.elapsed();
                if elapsed < self.min_interval {
                    tokio::time::sleep(self.min_interval - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        Ok(RateLimitGuard { _permit: permit })
    }

    pub fn max_per_minute(&self) -> usize {
        self.max_per_minute
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// RAII guard returned by [`RateLimiter::acquire`]
pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

/// HTTP client for one named provider: per-request timeout plus rate limiting
///
/// Every failure is mapped to a [`ProviderError`] tagged with the provider name.
pub struct ProviderClient {
    name: &'static str,
    client: Client,
    rate_limiter: RateLimiter,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(
        name: &'static str,
        rate_limit_per_minute: usize,
        timeout_secs: u64,
    ) -> Result<Self, String> {
        if timeout_secs == 0 {
            return Err(format!("{}: timeout must be greater than zero", name));
        }

        let client = Client::builder()
            .user_agent(concat!("holderwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            name,
            client,
            rate_limiter: RateLimiter::new(rate_limit_per_minute),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    async fn execute_request(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        let guard = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|message| ProviderError::Request {
                provider: self.name,
                message,
            })?;

        let start = Instant::now();
        let result = builder.timeout(self.timeout).send().await;
        drop(guard);

        logger::debug(
            LogTag::Api,
            &format!(
                "{} {} answered in {}ms",
                self.name,
                endpoint,
                start.elapsed().as_millis()
            ),
        );

        result.map_err(|e| ProviderError::from_reqwest(self.name, e, self.timeout_ms()))
    }

    /// Send a request and decode a successful JSON body
    pub async fn get_json<T>(&self, endpoint: &str, builder: RequestBuilder) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let response = self.execute_request(endpoint, builder).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                provider: self.name,
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        response.json::<T>().await.map_err(|e| ProviderError::Parse {
            provider: self.name,
            message: e.to_string(),
        })
    }

    /// JSON-RPC 2.0 call returning the `result` member
    pub async fn rpc_call(
        &self,
        url: &str,
        id: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let builder = self.client.post(url).json(&body);
        let envelope: Value = self.get_json(method, builder).await?;
        rpc_result(self.name, envelope)
    }
}

/// Unwrap a JSON-RPC envelope into its result, mapping `error` objects
pub fn rpc_result(provider: &'static str, envelope: Value) -> Result<Value, ProviderError> {
    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        return Err(ProviderError::Rpc {
            provider,
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    match envelope {
        Value::Object(mut map) => map.remove("result").ok_or(ProviderError::Parse {
            provider,
            message: "missing result".to_string(),
        }),
        _ => Err(ProviderError::Parse {
            provider,
            message: "response is not an object".to_string(),
        }),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_result_extracts_result() {
        let value = rpc_result("rpc", json!({"jsonrpc": "2.0", "id": 1, "result": {"value": []}})).unwrap();
        assert_eq!(value, json!({"value": []}));
    }

    #[test]
    fn test_rpc_result_maps_error() {
        let err = rpc_result(
            "rpc",
            json!({"jsonrpc": "2.0", "error": {"code": -32602, "message": "Invalid param"}}),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProviderError::Rpc {
                provider: "rpc",
                code: -32602,
                message: "Invalid param".to_string()
            }
        );
    }

    #[test]
    fn test_rpc_result_missing() {
        let err = rpc_result("rpc", json!({"jsonrpc": "2.0"})).unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[test]
    fn test_rate_limiter_interval() {
        assert_eq!(RateLimiter::new(60).min_interval(), Duration::from_secs(1));
        assert!(RateLimiter::new(0).min_interval().is_zero());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(600);
        let start = Instant::now();
        drop(limiter.acquire().await.unwrap());
        drop(limiter.acquire().await.unwrap());
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
