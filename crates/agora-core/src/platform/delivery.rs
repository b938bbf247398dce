//! ChannelDelivery: sends agent replies into one channel through their
//! bound identities, chunked under the platform limit.

use tracing::debug;

use agora_types::channel::{ChannelId, WebhookHandle};
use agora_types::error::{BindingError, PlatformError};

use crate::agent::ConversationAgent;
use crate::conversation::MessageSink;

use super::MessagingPlatform;
use super::binding::IdentityBinder;
use super::chunker::chunk_message;

pub struct ChannelDelivery<'a, P: MessagingPlatform> {
    binder: &'a IdentityBinder<P>,
    channel: ChannelId,
    message_limit: usize,
}

impl<'a, P: MessagingPlatform> ChannelDelivery<'a, P> {
    pub fn new(binder: &'a IdentityBinder<P>, channel: ChannelId, message_limit: usize) -> Self {
        Self {
            binder,
            channel,
            message_limit,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Bind every agent's identity to the channel before the first turn.
    pub async fn prepare(&self, agents: &[ConversationAgent]) -> Result<(), BindingError> {
        for agent in agents {
            self.bind(agent).await?;
        }
        Ok(())
    }

    async fn bind(&self, agent: &ConversationAgent) -> Result<WebhookHandle, BindingError> {
        self.binder
            .bind(self.channel, agent.display_name(), agent.avatar_url())
            .await
    }

    /// Post `content` through an already bound identity.
    ///
    /// If the platform no longer knows the identity, it is bound again once
    /// and the remaining chunks go through the replacement.
    pub async fn send_as(
        &self,
        handle: &WebhookHandle,
        avatar_url: Option<&str>,
        content: &str,
    ) -> Result<(), PlatformError> {
        let chunks = chunk_message(content, self.message_limit);
        debug!(identity = %handle.name, chunks = chunks.len(), "Delivering reply");

        let platform = self.binder.platform();
        let mut current = handle.clone();
        let mut replaced = false;
        for chunk in &chunks {
            match platform.execute_webhook(&current, chunk).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() && !replaced => {
                    current = self.binder.replace(self.channel, &current, avatar_url).await?;
                    replaced = true;
                    platform.execute_webhook(&current, chunk).await?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl<P: MessagingPlatform> MessageSink for ChannelDelivery<'_, P> {
    async fn deliver(&self, agent: &ConversationAgent, content: &str) -> Result<(), PlatformError> {
        let handle = self.bind(agent).await?;
        self.send_as(&handle, agent.avatar_url(), content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::platform::registry::BindingRegistry;
    use crate::testing::FakePlatform;
    use agora_types::config::GenerationSettings;
    use agora_types::persona::PersonaTemplate;
    use std::sync::Arc;

    fn setup() -> (IdentityBinder<FakePlatform>, Arc<FakePlatform>) {
        let platform = Arc::new(FakePlatform::new());
        let binder = IdentityBinder::new(
            platform.clone(),
            Arc::new(BindingRegistry::new()),
            Arc::new(SystemClock),
        );
        (binder, platform)
    }

    fn agent(name: &str) -> ConversationAgent {
        let template = PersonaTemplate::new(name, "p", None);
        ConversationAgent::from_template(&template, &GenerationSettings::default(), 10)
    }

    #[tokio::test]
    async fn test_deliver_chunks_long_replies() {
        let (binder, platform) = setup();
        let delivery = ChannelDelivery::new(&binder, ChannelId(10), 10);

        delivery
            .deliver(&agent("tech"), "aaaa bbbb cccc dddd")
            .await
            .unwrap();

        let sent = platform.sent();
        let contents: Vec<&str> = sent.iter().map(|(_, _, c)| c.as_str()).collect();
        assert_eq!(contents, vec!["aaaa bbbb", "cccc dddd"]);
        assert!(sent.iter().all(|(name, ch, _)| name == "Agent_tech" && *ch == ChannelId(10)));
    }

    #[tokio::test]
    async fn test_prepare_binds_each_agent_once() {
        let (binder, platform) = setup();
        let delivery = ChannelDelivery::new(&binder, ChannelId(11), 2000);
        let agents = vec![agent("tech"), agent("science")];

        delivery.prepare(&agents).await.unwrap();
        delivery.deliver(&agents[0], "hi").await.unwrap();
        assert_eq!(platform.created(), 2);
    }

    #[tokio::test]
    async fn test_deliver_recreates_identity_deleted_elsewhere() {
        let (binder, platform) = setup();
        let delivery = ChannelDelivery::new(&binder, ChannelId(10), 2000);
        let tech = agent("tech");

        delivery.deliver(&tech, "first").await.unwrap();
        let original = platform.webhooks()[0].id;
        platform.delete_webhook(original).await.unwrap();

        delivery.deliver(&tech, "second").await.unwrap();
        delivery.deliver(&tech, "third").await.unwrap();

        assert_eq!(platform.created(), 2);
        let hooks = platform.webhooks();
        assert_eq!(hooks.len(), 1);
        assert_ne!(hooks[0].id, original);
        assert_eq!(binder.registry().len(), 1);
        let contents: Vec<String> = platform.sent().into_iter().map(|(_, _, c)| c).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }
}
