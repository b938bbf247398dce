//! Requests and outcomes of multi-agent conversations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;

/// Topic used when a simulation is started without one.
pub const DEFAULT_TOPIC: &str = "Tell me about yourself";

/// Totals accumulated by one run of the turn scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    /// Sum of generation latencies across all delivered messages.
    pub total_latency: Duration,
    pub message_count: u32,
}

impl ConversationStats {
    pub fn record(&mut self, latency: Duration) {
        self.total_latency += latency;
        self.message_count += 1;
    }

    /// Mean generation latency, or zero when nothing was produced.
    pub fn average_latency(&self) -> Duration {
        if self.message_count == 0 {
            Duration::ZERO
        } else {
            self.total_latency / self.message_count
        }
    }
}

/// Parameters of a multi-turn simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default = "default_agent_count")]
    pub agent_count: usize,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_turns")]
    pub turns: u32,
    #[serde(default)]
    pub random_order: bool,
    pub channel_id: ChannelId,
}

fn default_agent_count() -> usize {
    2
}

fn default_turns() -> u32 {
    3
}

impl SimulationRequest {
    pub fn new(channel_id: ChannelId) -> Self {
        Self {
            agent_count: default_agent_count(),
            topic: None,
            turns: default_turns(),
            random_order: false,
            channel_id,
        }
    }

    /// The opening message, falling back to [`DEFAULT_TOPIC`].
    pub fn topic_or_default(&self) -> &str {
        self.topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TOPIC)
    }
}

/// A one-off question to a single persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub persona: String,
    pub question: String,
    pub channel_id: ChannelId,
}

/// Result of a one-off question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskOutcome {
    pub display_name: String,
    pub content: String,
    pub latency: Duration,
}

/// Stage reached by a running simulation or question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProgressStage {
    CreatingAgents { count: usize },
    GeneratingResponses,
    Completed { stats: ConversationStats },
}
