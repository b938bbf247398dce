//! ConversationAgent: a persona instantiated for one session.

use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info_span};

use agora_types::config::GenerationSettings;
use agora_types::llm::{ChatRequest, LlmError, Message, MessageRole, SamplingOptions};
use agora_types::persona::{AgentIdentity, PersonaTemplate};

use crate::llm::box_provider::BoxChatProvider;

use super::history::RollingHistory;

/// Model name and sampling options shared by all agents of one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub model: String,
    pub options: SamplingOptions,
}

impl From<&GenerationSettings> for ModelProfile {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            model: settings.model.clone(),
            options: settings.parameters.clone(),
        }
    }
}

/// One generated reply and the wall-clock time the call took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub content: String,
    pub latency: Duration,
}

/// A live, ephemeral agent. Never persisted.
#[derive(Debug, Clone)]
pub struct ConversationAgent {
    identity: AgentIdentity,
    system_prompt: String,
    avatar_url: Option<String>,
    history: RollingHistory,
    profile: ModelProfile,
}

impl ConversationAgent {
    pub fn new(
        identity: AgentIdentity,
        system_prompt: impl Into<String>,
        profile: ModelProfile,
        history_limit: usize,
    ) -> Self {
        Self {
            identity,
            system_prompt: system_prompt.into(),
            avatar_url: None,
            history: RollingHistory::new(history_limit),
            profile,
        }
    }

    /// Instantiate an agent from a persona template.
    ///
    /// The system prompt is the user's global prompt followed by a blank
    /// line and the persona's personality.
    pub fn from_template(
        template: &PersonaTemplate,
        settings: &GenerationSettings,
        history_limit: usize,
    ) -> Self {
        let mut agent = Self::new(
            AgentIdentity::for_persona(&template.name),
            format!("{}\n\n{}", settings.system_prompt, template.personality),
            ModelProfile::from(settings),
            history_limit,
        );
        agent.avatar_url = Some(template.avatar_url.clone());
        agent
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    pub fn append_turn(&mut self, role: MessageRole, content: impl Into<String>) {
        self.history.push(role, content);
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    /// The exact message list sent to the model.
    ///
    /// A system message framing the current topic, followed by the whole
    /// rolling history in order. The framing line is rebuilt on every call.
    pub fn build_prompt(&self, topic: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(Message::system(format!(
            "{}\nThe current topic being discussed is: {topic}",
            self.system_prompt
        )));
        messages.extend(self.history.iter().cloned());
        messages
    }

    /// Generate a reply to `topic`.
    ///
    /// The topic is stored as a user turn before the call and the reply as an
    /// assistant turn after it. On failure the user turn stays in history.
    pub async fn generate(
        &mut self,
        provider: &BoxChatProvider,
        topic: &str,
    ) -> Result<Generation, LlmError> {
        self.append_turn(MessageRole::User, topic);

        let request = ChatRequest {
            model: self.profile.model.clone(),
            messages: self.build_prompt(topic),
            options: self.profile.options.clone(),
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.options.num_predict,
            gen_ai.request.temperature = request.options.temperature,
            agent = %self.identity.display_name,
        );

        let started = Instant::now();
        let response = provider.chat(&request).instrument(span).await?;
        let latency = started.elapsed();

        debug!(
            agent = %self.identity.display_name,
            latency_ms = latency.as_millis() as u64,
            chars = response.message.content.len(),
            "Generated reply"
        );

        self.append_turn(MessageRole::Assistant, response.message.content.clone());
        Ok(Generation {
            content: response.message.content,
            latency,
        })
    }
}
