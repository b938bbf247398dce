//! HTTP request handlers for the REST API.

pub mod channel;
pub mod conversation;
pub mod events;
pub mod persona;
pub mod settings;

use std::time::Instant;

use axum::Json;
use serde::Serialize;

use agora_types::config::UserKey;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Convert a service error, reporting it first if it is unexpected.
pub(crate) async fn reported<T, E>(
    state: &AppState,
    command: &str,
    result: Result<T, E>,
) -> Result<T, AppError>
where
    E: Into<AppError>,
{
    match result {
        Ok(value) => Ok(value),
        Err(err) => Err(err.into().reported(state, command).await),
    }
}

/// Wrap `data` in a success envelope timed from `start`.
pub(crate) fn envelope<T: Serialize>(data: T, start: Instant) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data, start))
}

pub(crate) fn user_key(raw: &str) -> Result<UserKey, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("user id cannot be empty".to_string()));
    }
    Ok(UserKey::new(raw))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
