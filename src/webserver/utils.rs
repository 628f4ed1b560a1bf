/// Response helpers shared by route handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::HolderWatchError;

/// 200 with the payload serialized as JSON
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Error body `{error, code, details?}`
pub fn error_response(status: StatusCode, code: &str, message: &str, details: Option<Value>) -> Response {
    let mut body = json!({
        "error": message,
        "code": code,
    });
    if let Some(details) = details {
        body["details"] = details;
    }
    (status, Json(body)).into_response()
}

pub fn status_for(err: &HolderWatchError) -> StatusCode {
    match err {
        HolderWatchError::Validation { .. } => StatusCode::BAD_REQUEST,
        HolderWatchError::Unauthorized => StatusCode::UNAUTHORIZED,
        HolderWatchError::RefreshInProgress { .. } => StatusCode::CONFLICT,
        HolderWatchError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        HolderWatchError::EmptyResult { .. } => StatusCode::NOT_FOUND,
        HolderWatchError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a service error onto its HTTP status and error body
///
/// Rate limiting also carries `nextRefresh` and `waitSeconds` at the top level
/// so clients can schedule the retry without parsing `details`; a conflicting
/// refresh carries `waitSeconds`.
pub fn service_error_response(err: &HolderWatchError) -> Response {
    let status = status_for(err);
    match err {
        HolderWatchError::RateLimited {
            wait_secs,
            next_allowed_ms,
        } => (
            status,
            Json(json!({
                "error": err.to_string(),
                "code": err.code(),
                "nextRefresh": next_allowed_ms,
                "waitSeconds": wait_secs,
            })),
        )
            .into_response(),
        HolderWatchError::RefreshInProgress { wait_secs } => (
            status,
            Json(json!({
                "error": err.to_string(),
                "code": err.code(),
                "waitSeconds": wait_secs,
            })),
        )
            .into_response(),
        HolderWatchError::Validation { field, reason } => error_response(
            status,
            err.code(),
            &err.to_string(),
            Some(json!({ "field": field, "reason": reason })),
        ),
        _ => error_response(status, err.code(), &err.to_string(), None),
    }
}
