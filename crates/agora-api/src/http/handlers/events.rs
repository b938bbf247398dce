//! Message events forwarded by a gateway relay.
//!
//! The relay posts each `MESSAGE_CREATE` payload unchanged. Replies to one
//! of the bot's identities are answered with the replying user's personas
//! and settings. The response always succeeds; failures are only logged.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::json;

use agora_core::service::ReplyOutcome;
use agora_infra::discord::types::DiscordMessage;
use agora_types::channel::ChannelMessage;
use agora_types::config::UserKey;

use super::envelope;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/events/message
pub async fn message_created(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(payload): Json<DiscordMessage>,
) -> Json<ApiResponse<serde_json::Value>> {
    let start = Instant::now();
    let message = ChannelMessage::from(payload);
    let user = UserKey::new(message.author.id.to_string());

    let body = match state.conversation_service.on_message(&user, &message).await {
        ReplyOutcome::Answered(outcome) => json!({
            "handled": true,
            "identity": outcome.display_name,
            "latency_ms": outcome.latency.as_millis() as u64,
        }),
        ReplyOutcome::Ignored(reason) => json!({ "handled": false, "reason": reason }),
    };
    envelope(body, start)
}
