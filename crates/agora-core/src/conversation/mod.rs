//! The multi-agent conversation engine.

pub mod scheduler;

use agora_types::error::PlatformError;

use crate::agent::ConversationAgent;

pub use scheduler::TurnScheduler;

/// Destination for the replies an agent produces during a conversation.
pub trait MessageSink: Send + Sync {
    /// Deliver one reply as `agent`. Oversized replies are split by the sink.
    fn deliver(
        &self,
        agent: &ConversationAgent,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;
}
