// HTTP response utilities - JSON bodies that keep data, empty and error apart
use crate::application::telemetry_api::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

pub fn status_for(error: &ApiError) -> StatusCode {
    match error {
        ApiError::Upstream { .. } | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ApiError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Auth(_) | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
    }
}

pub fn error_response(error: &ApiError) -> Response {
    tracing::error!("Request failed: {}", error);
    let body = json!({
        "status": "error",
        "message": error.to_string(),
        "recoverable": error.is_recoverable(),
    });
    (status_for(error), Json(body)).into_response()
}

pub fn data_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok", "data": data }))).into_response()
}

/// `Ok(None)` is a valid "nothing yet" answer, not an error
pub fn optional_response<T: Serialize>(result: Result<Option<T>, ApiError>) -> Response {
    match result {
        Ok(Some(data)) => data_response(data),
        Ok(None) => (StatusCode::OK, Json(json!({ "status": "empty" }))).into_response(),
        Err(e) => error_response(&e),
    }
}

pub fn list_response<T: Serialize>(result: Result<Vec<T>, ApiError>) -> Response {
    match result {
        Ok(items) if items.is_empty() => (StatusCode::OK, Json(json!({ "status": "empty", "data": [] }))).into_response(),
        Ok(items) => data_response(items),
        Err(e) => error_response(&e),
    }
}
