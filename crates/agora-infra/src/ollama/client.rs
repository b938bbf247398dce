//! OllamaClient -- concrete [`ChatProvider`] implementation for a local
//! Ollama server.

use std::time::Duration;

use agora_core::llm::provider::ChatProvider;
use agora_types::llm::{ChatRequest, ChatResponse, LlmError, Message, MessageRole};

use super::types::{OllamaChatRequest, OllamaChatResponse, OllamaErrorBody, OllamaMessage, OllamaTags};

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for the server at `base_url`
    /// (e.g. `http://localhost:11434`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn to_ollama_request<'a>(request: &'a ChatRequest) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
            options: &request.options,
        }
    }

    fn from_ollama_response(response: OllamaChatResponse) -> ChatResponse {
        let role = response
            .message
            .role
            .parse()
            .unwrap_or(MessageRole::Assistant);
        ChatResponse {
            model: response.model,
            message: Message {
                role,
                content: response.message.content,
            },
            total_duration_ns: response.total_duration,
            eval_count: response.eval_count,
        }
    }
}

fn transport_error(err: reqwest::Error) -> LlmError {
    if err.is_connect() || err.is_timeout() {
        LlmError::Unreachable(err.to_string())
    } else {
        LlmError::Provider {
            message: format!("HTTP request failed: {err}"),
        }
    }
}

async fn status_error(response: reqwest::Response, model: &str) -> LlmError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<OllamaErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    match status.as_u16() {
        404 => LlmError::ModelNotFound(model.to_string()),
        400 => LlmError::InvalidRequest(detail),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {detail}"),
        },
    }
}

impl ChatProvider for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = Self::to_ollama_request(request);

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, &request.model).await);
        }

        let ollama_resp: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        tracing::debug!(
            model = %ollama_resp.model,
            done = ollama_resp.done,
            eval_count = ollama_resp.eval_count,
            "Ollama chat response"
        );
        Ok(Self::from_ollama_response(ollama_resp))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response, "").await);
        }

        let tags: OllamaTags = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse model list: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
