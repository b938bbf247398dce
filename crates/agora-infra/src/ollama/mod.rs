//! Ollama chat provider.
//!
//! Non-streaming `/api/chat` calls and model discovery via `/api/tags`.

pub mod client;
pub mod types;

pub use client::OllamaClient;
