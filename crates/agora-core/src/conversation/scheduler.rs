//! TurnScheduler: round-robin turn-taking among live agents.
//!
//! Algorithm:
//! 1. Fail with `NoAgents` on an empty set.
//! 2. Clear every agent's history.
//! 3. The first speaker (first agent, or a random one) answers the topic.
//! 4. For each turn, every agent except the one who spoke last answers the
//!    latest message once, in registration order or shuffled.
//!
//! With `n` agents a run produces `1 + turns * (n - 1)` messages. A speaker
//! never talks twice in a row but may recur after one other speaker.
//! Turns run strictly one after another; the first failure aborts the rest.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use agora_types::conversation::ConversationStats;
use agora_types::error::ConversationError;

use crate::agent::ConversationAgent;
use crate::llm::box_provider::BoxChatProvider;

use super::MessageSink;

pub struct TurnScheduler<'a, S: MessageSink> {
    provider: &'a BoxChatProvider,
    sink: &'a S,
}

impl<'a, S: MessageSink> TurnScheduler<'a, S> {
    pub fn new(provider: &'a BoxChatProvider, sink: &'a S) -> Self {
        Self { provider, sink }
    }

    /// Run a conversation and return the accumulated latency and count.
    pub async fn run<R: Rng + Send>(
        &self,
        agents: &mut [ConversationAgent],
        topic: &str,
        turns: u32,
        random_order: bool,
        rng: &mut R,
    ) -> Result<ConversationStats, ConversationError> {
        if agents.is_empty() {
            return Err(ConversationError::NoAgents);
        }

        for agent in agents.iter_mut() {
            agent.reset_history();
        }

        let first = if random_order {
            rng.gen_range(0..agents.len())
        } else {
            0
        };

        let mut stats = ConversationStats::default();
        let mut current = self.speak(&mut agents[first], topic, &mut stats).await?;
        let mut last_speaker = first;

        for turn in 1..=turns {
            let mut eligible: Vec<usize> = (0..agents.len()).filter(|&i| i != last_speaker).collect();
            if random_order {
                eligible.shuffle(rng);
            }

            for idx in eligible {
                current = self.speak(&mut agents[idx], &current, &mut stats).await?;
                last_speaker = idx;
            }
            info!(turn, messages = stats.message_count, "Turn completed");
        }

        Ok(stats)
    }

    async fn speak(
        &self,
        agent: &mut ConversationAgent,
        message: &str,
        stats: &mut ConversationStats,
    ) -> Result<String, ConversationError> {
        let generation = agent
            .generate(self.provider, message)
            .await
            .map_err(|source| ConversationError::Generation {
                agent: agent.display_name().to_string(),
                source,
            })?;

        self.sink
            .deliver(agent, &generation.content)
            .await
            .map_err(|source| ConversationError::Delivery {
                agent: agent.display_name().to_string(),
                source,
            })?;

        stats.record(generation.latency);
        info!(
            agent = %agent.display_name(),
            latency_ms = generation.latency.as_millis() as u64,
            "Agent spoke"
        );
        Ok(generation.content)
    }
}
