//! Ollama REST API types.
//!
//! Wire shapes for `/api/chat` and `/api/tags`. They are NOT the generic
//! chat types from agora-types; the client converts between the two.

use serde::{Deserialize, Serialize};

use agora_types::llm::SamplingOptions;

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OllamaMessage>,
    /// Always `false`: replies are consumed whole.
    pub stream: bool,
    pub options: &'a SamplingOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

/// Response body of a non-streaming `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub message: OllamaMessage,
    #[serde(default)]
    pub done: bool,
    /// Nanoseconds spent on the whole request server-side.
    pub total_duration: Option<u64>,
    pub eval_count: Option<u32>,
}

/// Response body of `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaTags {
    #[serde(default)]
    pub models: Vec<OllamaModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

/// Error body Ollama returns with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaErrorBody {
    pub error: String,
}
