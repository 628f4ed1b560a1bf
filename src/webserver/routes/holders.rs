//! Holder ledger API routes
//!
//! Read-only queries plus the secret-protected control operations.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::arguments::is_debug_webserver_enabled;
use crate::holders::RefreshOutcome;
use crate::logger::{self, LogTag};
use crate::webserver::state::AppState;
use crate::webserver::utils::{error_response, service_error_response, success_response};

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchHoldersRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mint_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub contract_address: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifySecretRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
struct FetchHoldersResponse {
    success: bool,
    #[serde(flatten)]
    outcome: RefreshOutcome,
}

// ============================================================================
// ROUTES
// ============================================================================

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/state", get(get_state))
        .route("/wallet/:address", get(get_wallet))
        .route("/fetch-holders", post(fetch_holders))
        .route("/update-ca", post(update_ca))
        .route("/verify-secret", post(verify_secret))
}

fn bad_body(rejection: JsonRejection) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "INVALID_BODY",
        &rejection.body_text(),
        None,
    )
}

/// GET /api/state
async fn get_state(State(state): State<Arc<AppState>>) -> Response {
    success_response(state.service.state_view())
}

/// GET /api/wallet/:address
async fn get_wallet(State(state): State<Arc<AppState>>, Path(address): Path<String>) -> Response {
    match state.service.query_address(&address) {
        Ok(report) => success_response(report),
        Err(e) => service_error_response(&e),
    }
}

/// POST /api/fetch-holders
async fn fetch_holders(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FetchHoldersRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match state
        .service
        .trigger_refresh(&request.password, &request.mint_address)
        .await
    {
        Ok(outcome) => {
            if is_debug_webserver_enabled() {
                logger::debug(
                    LogTag::Webserver,
                    &format!(
                        "fetch-holders: {} holders via {:?} (ledgerUpdated={})",
                        outcome.holders_count, outcome.provider, outcome.ledger_updated
                    ),
                );
            }
            success_response(FetchHoldersResponse {
                success: true,
                outcome,
            })
        }
        Err(e) => {
            logger::warning(LogTag::Webserver, &format!("fetch-holders rejected: {}", e));
            service_error_response(&e)
        }
    }
}

/// POST /api/update-ca
async fn update_ca(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateCaRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match state
        .service
        .set_tracked_address(&request.password, &request.contract_address)
    {
        Ok(contract_address) => success_response(json!({
            "success": true,
            "contractAddress": contract_address,
        })),
        Err(e) => service_error_response(&e),
    }
}

/// POST /api/verify-secret
async fn verify_secret(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VerifySecretRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    success_response(json!({ "valid": state.service.verify_secret(&request.password) }))
}
