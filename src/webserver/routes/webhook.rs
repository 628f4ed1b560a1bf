//! Enhanced-transaction webhook receiver

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::logger::{self, LogTag};
use crate::webserver::state::AppState;
use crate::webserver::utils::{error_response, service_error_response, success_response};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/helius", post(receive_helius))
}

/// POST /webhook/helius
async fn receive_helius(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Vec<serde_json::Value>>, JsonRejection>,
) -> Response {
    let Json(entries) = match body {
        Ok(body) => body,
        Err(rejection) => {
            logger::warning(
                LogTag::Ingest,
                &format!("Malformed webhook delivery: {}", rejection.body_text()),
            );
            return error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_BODY",
                &rejection.body_text(),
                None,
            );
        }
    };

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.service.ingest_payload(auth, entries) {
        Ok(report) => {
            logger::debug(
                LogTag::Ingest,
                &format!(
                    "Webhook: received={} processed={} duplicates={} ignored={}",
                    report.received, report.processed, report.duplicates, report.ignored
                ),
            );
            success_response(json!({
                "received": true,
                "processed": report.processed,
            }))
        }
        Err(e) => {
            logger::warning(LogTag::Ingest, &format!("Webhook rejected: {}", e));
            service_error_response(&e)
        }
    }
}
