//! Conversation service: simulations, one-off questions and replies.
//!
//! Builds ephemeral agents from the requesting user's personas and
//! settings, binds their identities in the target channel and hands them
//! to the [`TurnScheduler`]. Agents are dropped when the call returns,
//! whatever the outcome; channel identities are kept for reuse.

use std::sync::Arc;

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use agora_types::channel::{ChannelId, ChannelMessage};
use agora_types::config::{AppConfig, UserKey};
use agora_types::conversation::{
    AskOutcome, AskRequest, ConversationStats, ProgressStage, SimulationRequest,
};
use agora_types::error::{BindingError, ConversationError, PersonaError};
use agora_types::persona::AgentIdentity;

use crate::agent::ConversationAgent;
use crate::conversation::TurnScheduler;
use crate::llm::box_provider::BoxChatProvider;
use crate::persona::PersonaRegistry;
use crate::platform::{ChannelDelivery, IdentityBinder, MessagingPlatform};
use crate::repository::ConfigRepository;

use super::progress::ProgressReporter;

/// What happened to an incoming channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Not a human reply to one of our identities.
    Ignored(&'static str),
    Answered(AskOutcome),
}

pub struct ConversationService<P: MessagingPlatform, R: ConfigRepository> {
    provider: Arc<BoxChatProvider>,
    binder: Arc<IdentityBinder<P>>,
    repo: Arc<R>,
    message_limit: usize,
    history_limit: usize,
}

impl<P: MessagingPlatform, R: ConfigRepository> ConversationService<P, R> {
    pub fn new(
        provider: Arc<BoxChatProvider>,
        binder: Arc<IdentityBinder<P>>,
        repo: Arc<R>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            binder,
            repo,
            message_limit: config.message_limit,
            history_limit: config.history_limit,
        }
    }

    pub fn binder(&self) -> &IdentityBinder<P> {
        &self.binder
    }

    /// Instantiate `count` agents from the user's active personas.
    pub async fn create_agents(
        &self,
        user: &UserKey,
        count: usize,
    ) -> Result<Vec<ConversationAgent>, PersonaError> {
        let config = self.repo.load_user(user).await?;
        let registry = PersonaRegistry::new(config.agent_templates);
        let agents = registry
            .select_active(count)?
            .into_iter()
            .map(|template| {
                ConversationAgent::from_template(template, &config.bot_config, self.history_limit)
            })
            .collect();
        Ok(agents)
    }

    /// Run a multi-turn simulation in the requested channel.
    pub async fn run_simulation(
        &self,
        user: &UserKey,
        request: &SimulationRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<ConversationStats, ConversationError> {
        let mut rng = StdRng::from_entropy();
        self.run_simulation_with_rng(user, request, progress, &mut rng)
            .await
    }

    pub async fn run_simulation_with_rng<G: Rng + Send>(
        &self,
        user: &UserKey,
        request: &SimulationRequest,
        progress: &dyn ProgressReporter,
        rng: &mut G,
    ) -> Result<ConversationStats, ConversationError> {
        info!(
            user = %user,
            agents = request.agent_count,
            turns = request.turns,
            random_order = request.random_order,
            channel = %request.channel_id,
            "Starting simulation"
        );

        progress.report(ProgressStage::CreatingAgents {
            count: request.agent_count,
        });
        let mut agents = self.create_agents(user, request.agent_count).await?;

        let delivery = ChannelDelivery::new(&self.binder, request.channel_id, self.message_limit);
        delivery.prepare(&agents).await?;

        progress.report(ProgressStage::GeneratingResponses);
        let scheduler = TurnScheduler::new(&self.provider, &delivery);
        let stats = scheduler
            .run(
                &mut agents,
                request.topic_or_default(),
                request.turns,
                request.random_order,
                rng,
            )
            .await?;

        info!(
            messages = stats.message_count,
            total_ms = stats.total_latency.as_millis() as u64,
            "Simulation completed"
        );
        progress.report(ProgressStage::Completed { stats });
        Ok(stats)
    }

    /// Ask one persona a single question, answered in the given channel.
    pub async fn ask(
        &self,
        user: &UserKey,
        request: &AskRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<AskOutcome, ConversationError> {
        progress.report(ProgressStage::CreatingAgents { count: 1 });
        let mut agent = self.temporary_agent(user, &request.persona).await?;

        let delivery = ChannelDelivery::new(&self.binder, request.channel_id, self.message_limit);
        let handle = self
            .binder
            .bind(request.channel_id, agent.display_name(), agent.avatar_url())
            .await?;

        progress.report(ProgressStage::GeneratingResponses);
        let outcome = self.answer(&mut agent, &delivery, &handle, &request.question).await?;

        let mut stats = ConversationStats::default();
        stats.record(outcome.latency);
        progress.report(ProgressStage::Completed { stats });
        Ok(outcome)
    }

    /// React to a message posted in a channel.
    ///
    /// Only human replies to a message sent by one of the bot's identities
    /// are answered: the persona behind that identity answers the reply in
    /// the reply's channel, with both messages as context.
    pub async fn handle_reply(
        &self,
        user: &UserKey,
        message: &ChannelMessage,
    ) -> Result<ReplyOutcome, ConversationError> {
        if message.author.bot {
            return Ok(ReplyOutcome::Ignored("author is a bot"));
        }
        let Some(referenced) = message.referenced_message_id else {
            return Ok(ReplyOutcome::Ignored("not a reply"));
        };

        let original = self
            .binder
            .platform()
            .fetch_message(message.channel_id, referenced)
            .await?;
        if original.webhook_id.is_none() {
            return Ok(ReplyOutcome::Ignored("replied message was not sent by an identity"));
        }

        let identity = AgentIdentity::from_display_name(&original.author.name);
        let mut agent = self.temporary_agent(user, &identity.persona_key).await?;

        // Bind under the name actually seen so the same identity answers.
        let handle = self
            .binder
            .bind(message.channel_id, &original.author.name, agent.avatar_url())
            .await?;

        let context = format!(
            "Previous message: {}\nUser's reply: {}",
            original.content, message.content
        );
        let delivery = ChannelDelivery::new(&self.binder, message.channel_id, self.message_limit);
        let outcome = self.answer(&mut agent, &delivery, &handle, &context).await?;

        info!(
            identity = %handle.name,
            channel = %message.channel_id,
            latency_ms = outcome.latency.as_millis() as u64,
            "Answered reply"
        );
        Ok(ReplyOutcome::Answered(outcome))
    }

    /// [`handle_reply`](Self::handle_reply) with failures logged and dropped.
    pub async fn on_message(&self, user: &UserKey, message: &ChannelMessage) -> ReplyOutcome {
        match self.handle_reply(user, message).await {
            Ok(outcome) => {
                if let ReplyOutcome::Ignored(reason) = &outcome {
                    debug!(message = %message.id, reason, "Message ignored");
                }
                outcome
            }
            Err(err) => {
                warn!(message = %message.id, error = %err, "Error handling identity reply");
                ReplyOutcome::Ignored("reply handling failed")
            }
        }
    }

    /// Delete the bot's identities in a channel.
    pub async fn cleanup(&self, channel: ChannelId) -> Result<usize, BindingError> {
        self.binder.unbind(channel).await
    }

    /// Delete tracked identities idle for longer than `max_idle_secs`.
    /// `0` keeps them forever.
    pub async fn reconcile(&self, max_idle_secs: u64) -> usize {
        let max_idle = Duration::seconds(i64::try_from(max_idle_secs).unwrap_or(i64::MAX));
        self.binder.reconcile(max_idle).await
    }

    async fn temporary_agent(
        &self,
        user: &UserKey,
        persona: &str,
    ) -> Result<ConversationAgent, PersonaError> {
        let config = self.repo.load_user(user).await?;
        let registry = PersonaRegistry::new(config.agent_templates);
        let template = registry.find(persona).ok_or_else(|| {
            let available: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
            PersonaError::NotFound(format!("{persona} (available: {})", available.join(", ")))
        })?;
        Ok(ConversationAgent::from_template(
            template,
            &config.bot_config,
            self.history_limit,
        ))
    }

    async fn answer(
        &self,
        agent: &mut ConversationAgent,
        delivery: &ChannelDelivery<'_, P>,
        handle: &agora_types::channel::WebhookHandle,
        prompt: &str,
    ) -> Result<AskOutcome, ConversationError> {
        let generation = agent.generate(&self.provider, prompt).await.map_err(|source| {
            ConversationError::Generation {
                agent: agent.display_name().to_string(),
                source,
            }
        })?;
        delivery
            .send_as(handle, agent.avatar_url(), &generation.content)
            .await
            .map_err(|source| ConversationError::Delivery {
                agent: agent.display_name().to_string(),
                source,
            })?;
        Ok(AskOutcome {
            display_name: handle.name.clone(),
            content: generation.content,
            latency: generation.latency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::platform::BindingRegistry;
    use crate::repository::InMemoryConfigRepository;
    use crate::service::progress::NoProgress;
    use crate::testing::{FakePlatform, ScriptedProvider};
    use agora_types::channel::{MessageAuthor, MessageId, UserId, WebhookId};
    use std::sync::Mutex;

    type Service = ConversationService<FakePlatform, InMemoryConfigRepository>;

    fn service_with(provider: ScriptedProvider) -> (Service, Arc<FakePlatform>) {
        let platform = Arc::new(FakePlatform::new());
        let binder = Arc::new(IdentityBinder::new(
            platform.clone(),
            Arc::new(BindingRegistry::new()),
            Arc::new(SystemClock),
        ));
        let service = ConversationService::new(
            Arc::new(BoxChatProvider::new(provider)),
            binder,
            Arc::new(InMemoryConfigRepository::new()),
            &AppConfig::default(),
        );
        (service, platform)
    }

    #[derive(Default)]
    struct StageLog(Mutex<Vec<ProgressStage>>);

    impl ProgressReporter for StageLog {
        fn report(&self, stage: ProgressStage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    #[tokio::test]
    async fn test_create_agents_uses_active_templates() {
        let (svc, _) = service_with(ScriptedProvider::new());
        let agents = svc.create_agents(&UserKey::new("1"), 3).await.unwrap();
        let names: Vec<&str> = agents.iter().map(|a| a.display_name()).collect();
        assert_eq!(names, vec!["Agent_politics", "Agent_sports", "Agent_finance"]);

        let err = svc.create_agents(&UserKey::new("1"), 7).await.unwrap_err();
        assert!(matches!(
            err,
            PersonaError::InsufficientActiveTemplates { requested: 7, active: 6 }
        ));
    }

    #[tokio::test]
    async fn test_simulation_reports_progress_and_counts() {
        let (svc, platform) = service_with(ScriptedProvider::new());
        let log = StageLog::default();
        let mut request = SimulationRequest::new(ChannelId(10));
        request.agent_count = 3;
        request.turns = 2;

        let stats = svc
            .run_simulation(&UserKey::new("1"), &request, &log)
            .await
            .unwrap();
        assert_eq!(stats.message_count, 5);
        assert_eq!(platform.sent().len(), 5);
        assert_eq!(platform.created(), 3);

        let stages = log.0.lock().unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], ProgressStage::CreatingAgents { count: 3 });
        assert!(matches!(stages[2], ProgressStage::Completed { .. }));
    }

    #[tokio::test]
    async fn test_ask_answers_through_persona_identity() {
        let (svc, platform) = service_with(ScriptedProvider::new());
        let request = AskRequest {
            persona: "TECH".to_string(),
            question: "What's new?".to_string(),
            channel_id: ChannelId(11),
        };
        let outcome = svc.ask(&UserKey::new("1"), &request, &NoProgress).await.unwrap();
        assert_eq!(outcome.display_name, "Agent_tech");
        assert_eq!(outcome.content, "reply-1");
        assert_eq!(
            platform.sent(),
            vec![("Agent_tech".to_string(), ChannelId(11), "reply-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_ask_unknown_persona() {
        let (svc, _) = service_with(ScriptedProvider::new());
        let request = AskRequest {
            persona: "poet".to_string(),
            question: "?".to_string(),
            channel_id: ChannelId(11),
        };
        let err = svc.ask(&UserKey::new("1"), &request, &NoProgress).await.unwrap_err();
        assert!(matches!(err, ConversationError::Persona(PersonaError::NotFound(_))));
    }

    fn human_reply(to: Option<MessageId>) -> ChannelMessage {
        ChannelMessage {
            id: MessageId(501),
            channel_id: ChannelId(12),
            guild_id: None,
            author: MessageAuthor {
                id: UserId(7),
                name: "alice".to_string(),
                bot: false,
            },
            content: "Are you sure?".to_string(),
            webhook_id: None,
            referenced_message_id: to,
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_reply_to_identity_message_is_answered() {
        let (svc, platform) = service_with(ScriptedProvider::new());
        let handle = svc.binder().bind(ChannelId(10), "Agent_science", None).await.unwrap();
        platform.add_message(ChannelMessage {
            id: MessageId(500),
            channel_id: ChannelId(10),
            guild_id: None,
            author: MessageAuthor {
                id: UserId(handle.id.get()),
                name: "Agent_science".to_string(),
                bot: true,
            },
            content: "Water boils at 100C.".to_string(),
            webhook_id: Some(WebhookId(handle.id.get())),
            referenced_message_id: None,
            timestamp: None,
        });

        let outcome = svc
            .handle_reply(&UserKey::new("7"), &human_reply(Some(MessageId(500))))
            .await
            .unwrap();
        assert!(matches!(outcome, ReplyOutcome::Answered(ref a) if a.display_name == "Agent_science"));

        // Same identity, moved to the reply's channel.
        assert_eq!(platform.created(), 1);
        let (name, channel, _) = platform.sent().pop().unwrap();
        assert_eq!(name, "Agent_science");
        assert_eq!(channel, ChannelId(12));
    }

    #[tokio::test]
    async fn test_non_replies_and_bots_are_ignored() {
        let (svc, platform) = service_with(ScriptedProvider::new());
        let user = UserKey::new("7");

        let outcome = svc.handle_reply(&user, &human_reply(None)).await.unwrap();
        assert_eq!(outcome, ReplyOutcome::Ignored("not a reply"));

        let mut from_bot = human_reply(Some(MessageId(500)));
        from_bot.author.bot = true;
        let outcome = svc.handle_reply(&user, &from_bot).await.unwrap();
        assert_eq!(outcome, ReplyOutcome::Ignored("author is a bot"));

        // Referenced message missing: swallowed by on_message.
        let outcome = svc.on_message(&user, &human_reply(Some(MessageId(999)))).await;
        assert!(matches!(outcome, ReplyOutcome::Ignored(_)));
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_identities() {
        let (svc, platform) = service_with(ScriptedProvider::new());
        let mut request = SimulationRequest::new(ChannelId(10));
        request.turns = 1;
        svc.run_simulation(&UserKey::new("1"), &request, &NoProgress)
            .await
            .unwrap();

        assert_eq!(svc.cleanup(ChannelId(10)).await.unwrap(), 2);
        assert!(platform.webhooks().is_empty());
        assert_eq!(svc.reconcile(0).await, 0);
    }
}
