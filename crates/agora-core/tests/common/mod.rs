//! In-memory implementations of the public ports for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use agora_core::llm::provider::ChatProvider;
use agora_core::platform::{AvatarImage, MessagingPlatform};
use agora_types::channel::{
    ChannelId, ChannelMessage, ChannelRef, GuildId, MessageId, UserId, WebhookHandle, WebhookId,
};
use agora_types::error::PlatformError;
use agora_types::llm::{ChatRequest, ChatResponse, LlmError, Message};

pub const BOT: UserId = UserId(7);
pub const GUILD: GuildId = GuildId(70);

fn unknown(what: &str) -> PlatformError {
    PlatformError::Http {
        status: 404,
        message: format!("Unknown {what}"),
    }
}

/// Every channel belongs to one guild; webhooks live in a vector.
#[derive(Default)]
pub struct MemoryPlatform {
    webhooks: Mutex<Vec<WebhookHandle>>,
    posts: Mutex<Vec<(String, ChannelId, String)>>,
    created: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryPlatform {
    pub fn posts(&self) -> Vec<(String, ChannelId, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn speakers(&self) -> Vec<String> {
        self.posts().into_iter().map(|(name, _, _)| name).collect()
    }

    pub fn webhooks(&self) -> Vec<WebhookHandle> {
        self.webhooks.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl MessagingPlatform for MemoryPlatform {
    fn current_user(&self) -> impl Future<Output = Result<UserId, PlatformError>> + Send {
        async { Ok(BOT) }
    }

    fn get_channel(
        &self,
        channel: ChannelId,
    ) -> impl Future<Output = Result<ChannelRef, PlatformError>> + Send {
        async move {
            Ok(ChannelRef {
                id: channel,
                guild_id: Some(GUILD),
                name: None,
            })
        }
    }

    fn guild_webhooks(
        &self,
        _guild: GuildId,
    ) -> impl Future<Output = Result<Vec<WebhookHandle>, PlatformError>> + Send {
        let hooks = self.webhooks();
        async move { Ok(hooks) }
    }

    fn channel_webhooks(
        &self,
        channel: ChannelId,
    ) -> impl Future<Output = Result<Vec<WebhookHandle>, PlatformError>> + Send {
        let hooks: Vec<_> = self
            .webhooks()
            .into_iter()
            .filter(|h| h.channel_id == channel)
            .collect();
        async move { Ok(hooks) }
    }

    fn create_webhook(
        &self,
        channel: ChannelId,
        name: &str,
        _avatar: Option<&AvatarImage>,
    ) -> impl Future<Output = Result<WebhookHandle, PlatformError>> + Send {
        let id = 500 + self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        self.created.fetch_add(1, Ordering::SeqCst);
        let handle = WebhookHandle {
            id: WebhookId(id),
            name: name.to_string(),
            channel_id: channel,
            token: Some(format!("tok-{id}")),
            owner_id: Some(BOT),
        };
        self.webhooks.lock().unwrap().push(handle.clone());
        async move { Ok(handle) }
    }

    fn move_webhook(
        &self,
        webhook: WebhookId,
        channel: ChannelId,
    ) -> impl Future<Output = Result<WebhookHandle, PlatformError>> + Send {
        let mut hooks = self.webhooks.lock().unwrap();
        let result = match hooks.iter_mut().find(|h| h.id == webhook) {
            Some(hook) => {
                hook.channel_id = channel;
                Ok(hook.clone())
            }
            None => Err(unknown("Webhook")),
        };
        async move { result }
    }

    fn execute_webhook(
        &self,
        webhook: &WebhookHandle,
        content: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let live = self
            .webhooks()
            .into_iter()
            .find(|h| h.id == webhook.id);
        let result = match live {
            Some(hook) => {
                self.posts
                    .lock()
                    .unwrap()
                    .push((hook.name, hook.channel_id, content.to_string()));
                Ok(())
            }
            None => Err(unknown("Webhook")),
        };
        async move { result }
    }

    fn delete_webhook(
        &self,
        webhook: WebhookId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let mut hooks = self.webhooks.lock().unwrap();
        let before = hooks.len();
        hooks.retain(|h| h.id != webhook);
        let result = if hooks.len() < before {
            Ok(())
        } else {
            Err(unknown("Webhook"))
        };
        async move { result }
    }

    fn fetch_message(
        &self,
        _channel: ChannelId,
        _message: MessageId,
    ) -> impl Future<Output = Result<ChannelMessage, PlatformError>> + Send {
        async { Err(unknown("Message")) }
    }

    fn fetch_avatar(
        &self,
        _url: &str,
    ) -> impl Future<Output = Result<Option<AvatarImage>, PlatformError>> + Send {
        async { Ok(None) }
    }
}

/// Answers every request with a fixed-length reply numbered by call.
pub struct CountingProvider {
    calls: AtomicUsize,
    reply_len: usize,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::with_reply_len(0)
    }

    /// Replies padded to at least `reply_len` characters.
    pub fn with_reply_len(reply_len: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply_len,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut content = format!("message {n}");
        while content.len() < self.reply_len {
            content.push_str(" xxxx");
        }
        let model = request.model.clone();
        async move {
            Ok(ChatResponse {
                model,
                message: Message::assistant(content),
                total_duration_ns: None,
                eval_count: None,
            })
        }
    }

    fn list_models(&self) -> impl Future<Output = Result<Vec<String>, LlmError>> + Send {
        async { Ok(vec!["llama3.2:latest".to_string()]) }
    }
}
