use crate::webserver::state::AppState;
use axum::Router;
use std::sync::Arc;

pub mod holders;
pub mod status;
pub mod webhook;
pub mod ws;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .nest("/webhook", webhook::routes())
        .merge(ws::routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(holders::routes())
}
