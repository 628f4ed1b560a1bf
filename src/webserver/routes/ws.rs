/// Subscriber WebSocket endpoint
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    logger::{self, LogTag},
    webserver::{state::AppState, ws::connection::handle_connection},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    state.increment_ws_connections();
    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!("WebSocket upgrade (active_ws={})", state.ws_connection_count()),
        );
    }

    ws.on_upgrade(move |socket| async move {
        handle_connection(socket, state.clone()).await;
        state.decrement_ws_connections();
    })
}
