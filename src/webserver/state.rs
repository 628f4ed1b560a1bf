/// Shared application state for the webserver
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::WebserverConfig;
use crate::holders::HolderService;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Webserver configuration
    pub config: Arc<WebserverConfig>,

    /// Ledger, refresh control and subscriber hub
    pub service: Arc<HolderService>,

    /// Active WebSocket connection count
    pub ws_connections: Arc<AtomicUsize>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: WebserverConfig, service: Arc<HolderService>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::Relaxed)
    }

    pub fn increment_ws_connections(&self) {
        self.ws_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_ws_connections(&self) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
