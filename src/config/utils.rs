/// Configuration utilities - loading, environment overrides, and access helpers
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

use super::schemas::Config;
use crate::errors::HolderWatchError;
use crate::logger::{self, LogTag};

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Environment variables that override secrets from the config file
pub const ENV_HELIUS_API_KEY: &str = "HELIUS_API_KEY";
pub const ENV_BIRDEYE_API_KEY: &str = "BIRDEYE_API_KEY";
pub const ENV_ADMIN_SECRET: &str = "ADMIN_SECRET";
pub const ENV_WEBHOOK_AUTH: &str = "WEBHOOK_AUTH";

/// Read a config file, falling back to defaults when it does not exist
///
/// Environment overrides are applied and the result is validated.
pub fn read_config_file(path: &str) -> Result<Config, HolderWatchError> {
    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HolderWatchError::Configuration(format!("Failed to read config file '{}': {}", path, e))
        })?;

        toml::from_str::<Config>(&contents).map_err(|e| {
            HolderWatchError::Configuration(format!("Failed to parse config file '{}': {}", path, e))
        })?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
        .validate()
        .map_err(HolderWatchError::Configuration)?;

    Ok(config)
}

/// Apply secret overrides from the environment
///
/// `lookup` is injected so tests do not depend on the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty(ENV_HELIUS_API_KEY) {
        config.fetcher.helius_api_key = Some(key);
    }
    if let Some(key) = non_empty(ENV_BIRDEYE_API_KEY) {
        config.fetcher.birdeye_api_key = Some(key);
    }
    if let Some(secret) = non_empty(ENV_ADMIN_SECRET) {
        config.auth.admin_secret = secret;
    }
    if let Some(header) = non_empty(ENV_WEBHOOK_AUTH) {
        config.auth.webhook_auth_header = Some(header);
    }
}

/// Load configuration from a path and initialize the global CONFIG
pub fn load_config_from_path(path: &str) -> Result<(), HolderWatchError> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| HolderWatchError::Configuration("Config already initialized".to_string()))?;

    Ok(())
}

/// Load configuration from the default path
pub fn load_config() -> Result<(), HolderWatchError> {
    load_config_from_path(CONFIG_FILE_PATH)
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when the config was never loaded.
///
/// ```ignore
/// let interval = with_config(|cfg| cfg.refresh.interval_secs);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration
///
/// Useful when values must be held across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let mut config = read_config_file(path.to_str().unwrap()).unwrap();
        // The real environment may carry overrides; compare the rest
        config.fetcher.helius_api_key = None;
        config.fetcher.birdeye_api_key = None;
        config.auth = Default::default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_field_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[refresh]\ninterval_secs = 60\n\n[ledger]\nactivity_cap = 10\n\n[webserver]\nport = 9000"
        )
        .unwrap();

        let config = read_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.refresh.interval_secs, 60);
        assert_eq!(config.ledger.activity_cap, 10);
        assert_eq!(config.ledger.list_cap, 100);
        assert_eq!(config.webserver.port, 9000);
        assert_eq!(config.webserver.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[refresh]\ninterval_secs = 0").unwrap();

        let err = read_config_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("refresh.interval_secs"));
    }

    #[test]
    fn test_unparseable_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[refresh\ninterval_secs = ").unwrap();

        let err = read_config_file(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HELIUS_API_KEY, "helius-key"),
            (ENV_ADMIN_SECRET, "s3cret"),
            (ENV_BIRDEYE_API_KEY, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.fetcher.helius_api_key.as_deref(), Some("helius-key"));
        assert_eq!(config.auth.admin_secret, "s3cret");
        // blank values are ignored
        assert_eq!(config.fetcher.birdeye_api_key, None);
        assert_eq!(config.auth.webhook_auth_header, None);
    }
}
