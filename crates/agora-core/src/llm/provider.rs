//! ChatProvider trait definition.
//!
//! The single call boundary between the conversation engine and the
//! inference server.

use agora_types::llm::{ChatRequest, ChatResponse, LlmError};

/// Trait for chat inference backends (Ollama, test doubles).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Calls are
/// non-streaming: the future resolves once the whole reply is available.
///
/// Implementations live in agora-infra (e.g., `OllamaClient`).
pub trait ChatProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a chat request and wait for the complete reply.
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatResponse, LlmError>> + Send;

    /// Names of the models the server can run.
    fn list_models(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, LlmError>> + Send;
}
