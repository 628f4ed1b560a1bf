/// Error types for holderwatch
///
/// Two layers:
/// - `ProviderError`: a single external data provider failed. Always isolated
///   inside the fetcher; the fallback chain logs it and moves on.
/// - `HolderWatchError`: everything a caller of the holder service can see.
use thiserror::Error;

// =============================================================================
// PROVIDER ERRORS
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("{provider}: request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: timed out after {timeout_ms}ms")]
    Timeout {
        provider: &'static str,
        timeout_ms: u64,
    },

    #[error("{provider}: HTTP {status}: {body}")]
    HttpStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider}: malformed response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: RPC error {code}: {message}")]
    Rpc {
        provider: &'static str,
        code: i64,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Request { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::HttpStatus { provider, .. }
            | ProviderError::Parse { provider, .. }
            | ProviderError::Rpc { provider, .. } => provider,
        }
    }

    /// Build from a reqwest failure, distinguishing timeouts
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                provider,
                timeout_ms,
            }
        } else {
            ProviderError::Request {
                provider,
                message: err.to_string(),
            }
        }
    }
}

// =============================================================================
// SERVICE ERRORS
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HolderWatchError {
    /// Every provider in the chain failed or returned nothing
    #[error("No holders found for {asset} (all providers exhausted)")]
    EmptyResult { asset: String },

    /// Explicit refresh requested before the interval elapsed
    #[error("Please wait {wait_secs} seconds before refreshing again")]
    RateLimited { wait_secs: u64, next_allowed_ms: i64 },

    /// Another snapshot refresh is already running; the running one resets
    /// the rate gate, so the wait is one full interval
    #[error("A holder refresh is already in progress, retry in {wait_secs} seconds")]
    RefreshInProgress { wait_secs: u64 },

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HolderWatchError {
    /// Stable machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            HolderWatchError::EmptyResult { .. } => "EMPTY_RESULT",
            HolderWatchError::RateLimited { .. } => "RATE_LIMITED",
            HolderWatchError::RefreshInProgress { .. } => "REFRESH_IN_PROGRESS",
            HolderWatchError::Validation { .. } => "VALIDATION_ERROR",
            HolderWatchError::Unauthorized => "UNAUTHORIZED",
            HolderWatchError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether retrying the same request later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HolderWatchError::RateLimited { .. }
                | HolderWatchError::RefreshInProgress { .. }
                | HolderWatchError::EmptyResult { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HolderWatchError>;

/// Validate a Solana address: base58 that decodes to exactly 32 bytes
pub fn validate_address(field: &'static str, address: &str) -> Result<()> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(HolderWatchError::Validation {
            field,
            reason: "address is required".to_string(),
        });
    }

    let decoded = bs58::decode(trimmed)
        .into_vec()
        .map_err(|e| HolderWatchError::Validation {
            field,
            reason: format!("not valid base58: {}", e),
        })?;

    if decoded.len() != 32 {
        return Err(HolderWatchError::Validation {
            field,
            reason: format!("expected 32 bytes, got {}", decoded.len()),
        });
    }

    Ok(())
}
