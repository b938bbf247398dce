//! Persona registry handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::json;

use agora_core::service::DefaultsLoaded;
use agora_types::persona::PersonaTemplate;

use super::{envelope, reported, user_key};
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePersonaBody {
    pub name: String,
    pub personality: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// GET /api/v1/users/{user}/personas
pub async fn list_personas(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<Vec<PersonaTemplate>>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let templates = reported(&state, "agent list", state.persona_service.list(&user).await).await?;
    Ok(envelope(templates, start))
}

/// POST /api/v1/users/{user}/personas
pub async fn create_persona(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
    Json(body): Json<CreatePersonaBody>,
) -> Result<Json<ApiResponse<PersonaTemplate>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let result = state
        .persona_service
        .create(&user, &body.name, &body.personality, body.avatar_url)
        .await;
    let created = reported(&state, "agent create", result).await?;
    let link = format!("/api/v1/users/{}/personas/{}", user, created.name);
    let Json(resp) = envelope(created, start);
    Ok(Json(resp.with_link("self", link)))
}

/// DELETE /api/v1/users/{user}/personas
pub async fn delete_all_personas(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let count = reported(
        &state,
        "agent delete-all",
        state.persona_service.delete_all(&user).await,
    )
    .await?;
    Ok(envelope(json!({ "deleted": count }), start))
}

/// DELETE /api/v1/users/{user}/personas/{name}
pub async fn delete_persona(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path((user, name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PersonaTemplate>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let removed = reported(
        &state,
        "agent delete",
        state.persona_service.delete(&user, &name).await,
    )
    .await?;
    Ok(envelope(removed, start))
}

/// POST /api/v1/users/{user}/personas/{name}/toggle
pub async fn toggle_persona(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path((user, name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let active = reported(
        &state,
        "agent toggle",
        state.persona_service.toggle(&user, &name).await,
    )
    .await?;
    Ok(envelope(json!({ "name": name, "active": active }), start))
}

/// POST /api/v1/users/{user}/personas/defaults
pub async fn load_defaults(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    let DefaultsLoaded { previous, loaded } = reported(
        &state,
        "agent default",
        state.persona_service.load_defaults(&user).await,
    )
    .await?;
    Ok(envelope(json!({ "previous": previous, "loaded": loaded }), start))
}
