use axum::{extract::State, response::Response, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    broadcast::HubMetricsSnapshot,
    holders::TrackedRefs,
    logger::{self, LogTag},
    webserver::{state::AppState, utils::success_response},
};

/// Health check response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub ws_connections: usize,
    pub subscribers: HubMetricsSnapshot,
    pub tracked: TrackedRefs,
    /// Unix ms
    pub last_refresh: Option<i64>,
    /// Unix ms
    pub next_refresh: Option<i64>,
    pub refreshing: bool,
    pub providers: Vec<&'static str>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// GET /api/health
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, "Health check endpoint called");
    }

    let service = &state.service;
    success_response(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        ws_connections: state.ws_connection_count(),
        subscribers: service.hub_metrics(),
        tracked: service.tracked(),
        last_refresh: service.last_refresh(),
        next_refresh: service.next_refresh(),
        refreshing: service.is_refreshing(),
        providers: service.provider_names(),
    })
}
