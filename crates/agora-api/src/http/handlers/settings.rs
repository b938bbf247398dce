//! Per-user generation settings handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::json;

use agora_types::llm::{SamplingOptions, SamplingUpdate};

use super::{envelope, reported, user_key};
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModelBody {
    pub model: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SystemPromptBody {
    /// Omitted or null restores the default prompt.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// GET /api/v1/users/{user}/settings
pub async fn get_settings(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let settings = reported(
        &state,
        "global parameters list",
        state.settings_service.settings(&user).await,
    )
    .await?;
    let models = reported(
        &state,
        "global parameters list",
        state.settings_service.refresh_models().await,
    )
    .await?;
    Ok(envelope(
        json!({ "settings": settings, "available_models": models }),
        start,
    ))
}

/// PUT /api/v1/users/{user}/settings
pub async fn update_parameters(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
    Json(update): Json<SamplingUpdate>,
) -> Result<Json<ApiResponse<SamplingOptions>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let options = reported(
        &state,
        "global parameters set",
        state.settings_service.set_parameters(&user, update).await,
    )
    .await?;
    Ok(envelope(options, start))
}

/// PUT /api/v1/users/{user}/settings/model
pub async fn set_model(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
    Json(body): Json<ModelBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let model = reported(
        &state,
        "global parameters model",
        state.settings_service.set_model(&user, &body.model).await,
    )
    .await?;
    Ok(envelope(json!({ "model": model }), start))
}

/// PUT /api/v1/users/{user}/settings/system-prompt
pub async fn set_system_prompt(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
    Json(body): Json<SystemPromptBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let prompt = reported(
        &state,
        "global set-system-prompt",
        state.settings_service.set_system_prompt(&user, body.prompt).await,
    )
    .await?;
    Ok(envelope(json!({ "system_prompt": prompt }), start))
}
