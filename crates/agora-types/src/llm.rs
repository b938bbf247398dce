//! Chat request/response types for the inference server.
//!
//! These types model the data shapes exchanged with a local chat model:
//! role-tagged messages, sampling options, and the non-streaming response.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// Sampling parameters shared by every agent of a user.
///
/// Every field falls back to its default when missing from a stored
/// configuration, which back-fills configs written by older versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    pub temperature: f64,
    /// Context window size in tokens.
    pub num_ctx: u32,
    pub top_k: u32,
    pub top_p: f64,
    pub repeat_penalty: f64,
    /// Maximum number of tokens to predict.
    pub num_predict: i32,
}

impl SamplingOptions {
    pub const DEFAULT_TEMPERATURE: f64 = 0.8;
    pub const DEFAULT_NUM_CTX: u32 = 2048;
    pub const DEFAULT_TOP_K: u32 = 40;
    pub const DEFAULT_TOP_P: f64 = 0.9;
    pub const DEFAULT_REPEAT_PENALTY: f64 = 1.1;
    pub const DEFAULT_NUM_PREDICT: i32 = 150;
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: Self::DEFAULT_TEMPERATURE,
            num_ctx: Self::DEFAULT_NUM_CTX,
            top_k: Self::DEFAULT_TOP_K,
            top_p: Self::DEFAULT_TOP_P,
            repeat_penalty: Self::DEFAULT_REPEAT_PENALTY,
            num_predict: Self::DEFAULT_NUM_PREDICT,
        }
    }
}

/// A partial update of [`SamplingOptions`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingUpdate {
    pub temperature: Option<f64>,
    pub num_ctx: Option<u32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub repeat_penalty: Option<f64>,
    pub num_predict: Option<i32>,
}

impl SamplingUpdate {
    /// Apply every provided field onto `options`.
    pub fn apply(&self, options: &mut SamplingOptions) {
        if let Some(v) = self.temperature {
            options.temperature = v;
        }
        if let Some(v) = self.num_ctx {
            options.num_ctx = v;
        }
        if let Some(v) = self.top_k {
            options.top_k = v;
        }
        if let Some(v) = self.top_p {
            options.top_p = v;
        }
        if let Some(v) = self.repeat_penalty {
            options.repeat_penalty = v;
        }
        if let Some(v) = self.num_predict {
            options.num_predict = v;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Request to the inference server for a single, non-streaming reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: SamplingOptions,
}

/// Reply from the inference server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: Message,
    /// Server-side total duration in nanoseconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ns: Option<u64>,
    /// Number of generated tokens, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
}

/// Errors from inference server operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("inference server unreachable: {0}")]
    Unreachable(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
