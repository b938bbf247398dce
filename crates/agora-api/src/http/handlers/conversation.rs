//! Simulation and one-off question handlers.
//!
//! Both run to completion before responding; progress is only logged.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde_json::json;

use agora_core::service::ProgressReporter;
use agora_types::conversation::{AskOutcome, AskRequest, ProgressStage, SimulationRequest};

use super::{envelope, reported, user_key};
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

struct LoggedProgress<'a> {
    user: &'a str,
}

impl ProgressReporter for LoggedProgress<'_> {
    fn report(&self, stage: ProgressStage) {
        tracing::debug!(user = self.user, ?stage, "Conversation progress");
    }
}

/// POST /api/v1/users/{user}/simulations
pub async fn run_simulation(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    if request.agent_count == 0 {
        return Err(AppError::Validation("agent_count must be at least 1".to_string()));
    }

    let progress = LoggedProgress { user: user.as_str() };
    let result = state
        .conversation_service
        .run_simulation(&user, &request, &progress)
        .await;
    let stats = reported(&state, "agent simulation", result).await?;

    Ok(envelope(
        json!({
            "channel_id": request.channel_id,
            "topic": request.topic_or_default(),
            "message_count": stats.message_count,
            "total_time_ms": stats.total_latency.as_millis() as u64,
            "average_time_ms": stats.average_latency().as_millis() as u64,
        }),
        start,
    ))
}

/// POST /api/v1/users/{user}/ask
pub async fn ask(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(user): Path<String>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ApiResponse<AskOutcome>>, AppError> {
    let start = Instant::now();
    let user = user_key(&user)?;
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let progress = LoggedProgress { user: user.as_str() };
    let result = state
        .conversation_service
        .ask(&user, &request, &progress)
        .await;
    let outcome = reported(&state, "agent ask", result).await?;
    Ok(envelope(outcome, start))
}
