/// Axum webserver implementation
///
/// Server lifecycle: bind, serve, graceful termination on ctrl-c or `shutdown()`
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::{
    config::WebserverConfig,
    holders::HolderService,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// This function blocks until the server is shut down
pub async fn start_server(config: WebserverConfig, service: Arc<HolderService>) -> Result<(), String> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    logger::debug(LogTag::Webserver, &format!("Starting webserver on {}", addr));

    let state = Arc::new(AppState::new(config, service));
    let app = build_app(state);

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another holderwatch instance (or other service) is listening on port {}.\n\
             Stop it or set webserver.port in the config file.",
            addr,
            addr.port()
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Port {} requires elevated privileges on this system.\n\
             Consider using a port above 1024 or running with appropriate permissions.",
            addr,
            addr.port()
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    logger::info(LogTag::Webserver, &format!("Listening on http://{}", addr));
    logger::debug(
        LogTag::Webserver,
        &format!("Subscriber endpoint at ws://{}/ws", addr),
    );

    let shutdown_signal = async {
        tokio::select! {
            _ = SHUTDOWN_NOTIFY.notified() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Failed to listen for ctrl-c: {}", e),
                    );
                }
            }
        }
        logger::info(LogTag::Webserver, "Received shutdown signal, stopping webserver...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");

    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    SHUTDOWN_NOTIFY.notify_one();
}

/// Build the Axum application with all routes and middleware
pub(crate) fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state).layer(CorsLayer::permissive())
}
