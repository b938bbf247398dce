use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde_json::json;

use agora_types::channel::ChannelId;

use super::{envelope, reported};
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/channels/{channel}/cleanup - Delete the bot's identities.
pub async fn cleanup(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(channel): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let channel: ChannelId = channel.parse().map_err(AppError::Validation)?;
    let removed = reported(
        &state,
        "global cleanup",
        state.conversation_service.cleanup(channel).await,
    )
    .await?;
    Ok(envelope(json!({ "channel_id": channel, "removed": removed }), start))
}
