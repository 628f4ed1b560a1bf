use anyhow::{Context, Result};

use holderwatch::{
    arguments::{config_path_arg, is_help_requested, print_help},
    config::{self, CONFIG_FILE_PATH},
    holders::{HolderFetcher, HolderService},
    logger::{self, LogTag},
};

/// Main entry point for holderwatch
///
/// Loads configuration, builds the provider chain and holder service, then
/// serves HTTP/WebSocket until ctrl-c.
#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    if is_help_requested() {
        print_help();
        return Ok(());
    }

    // Secrets may live in .env; must load before the config reads the environment
    #[cfg(feature = "env-file")]
    {
        if dotenv::dotenv().is_ok() {
            logger::debug(LogTag::Config, "Loaded environment from .env");
        }
    }

    let config_path = config_path_arg().unwrap_or_else(|| CONFIG_FILE_PATH.to_string());
    config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    let config = config::get_config_clone();

    logger::info(LogTag::System, "holderwatch starting up...");

    if config.auth.admin_secret.is_empty() {
        logger::warning(
            LogTag::Config,
            "auth.admin_secret is empty; control operations will reject every request",
        );
    }
    if config.auth.webhook_auth_header.is_none() {
        logger::warning(
            LogTag::Config,
            "auth.webhook_auth_header not set; webhook deliveries are accepted unauthenticated",
        );
    }

    let fetcher = HolderFetcher::from_config(&config.fetcher)
        .map_err(anyhow::Error::msg)
        .context("Failed to build holder provider chain")?;
    logger::info(
        LogTag::Fetcher,
        &format!("Provider chain: {}", fetcher.provider_names().join(" -> ")),
    );

    let service = HolderService::new(&config, fetcher);

    #[cfg(feature = "web")]
    {
        holderwatch::webserver::start_server(config.webserver.clone(), service)
            .await
            .map_err(anyhow::Error::msg)?;
    }

    #[cfg(not(feature = "web"))]
    {
        let _service = service;
        logger::info(LogTag::System, "Built without the web feature; waiting for ctrl-c");
        tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
    }

    logger::info(LogTag::System, "holderwatch stopped");
    Ok(())
}
