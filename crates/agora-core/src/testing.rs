//! In-memory fakes of the port traits shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use agora_types::channel::{
    ChannelId, ChannelMessage, ChannelRef, GuildId, MessageId, UserId, WebhookHandle, WebhookId,
};
use agora_types::error::PlatformError;
use agora_types::llm::{ChatRequest, ChatResponse, LlmError, Message};

use crate::llm::provider::ChatProvider;
use crate::platform::{AvatarImage, MessagingPlatform};

pub(crate) const BOT: UserId = UserId(1);
pub(crate) const GUILD: GuildId = GuildId(100);

#[derive(Default)]
struct FakeState {
    channels: HashMap<ChannelId, GuildId>,
    webhooks: Vec<WebhookHandle>,
    sent: Vec<(String, ChannelId, String)>,
    messages: HashMap<MessageId, ChannelMessage>,
    created: usize,
    moved: usize,
    next_id: u64,
    fail_deletes: bool,
}

/// A single-guild platform kept entirely in memory.
pub(crate) struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    /// A guild with channels 10, 11 and 12.
    pub(crate) fn new() -> Self {
        let mut state = FakeState {
            next_id: 1000,
            ..Default::default()
        };
        for id in [10, 11, 12] {
            state.channels.insert(ChannelId(id), GUILD);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    pub(crate) fn add_foreign_webhook(&self, name: &str, channel: ChannelId) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.webhooks.push(WebhookHandle {
            id: WebhookId(id),
            name: name.to_string(),
            channel_id: channel,
            token: None,
            owner_id: Some(UserId(999)),
        });
    }

    pub(crate) fn add_message(&self, message: ChannelMessage) {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(message.id, message);
    }

    pub(crate) fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }

    pub(crate) fn webhooks(&self) -> Vec<WebhookHandle> {
        self.state.lock().unwrap().webhooks.clone()
    }

    /// `(identity name, channel, content)` for every executed post.
    pub(crate) fn sent(&self) -> Vec<(String, ChannelId, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub(crate) fn speakers(&self) -> Vec<String> {
        self.sent().into_iter().map(|(name, _, _)| name).collect()
    }

    pub(crate) fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub(crate) fn moved(&self) -> usize {
        self.state.lock().unwrap().moved
    }
}

impl MessagingPlatform for FakePlatform {
    fn current_user(&self) -> impl Future<Output = Result<UserId, PlatformError>> + Send {
        async { Ok(BOT) }
    }

    fn get_channel(
        &self,
        channel: ChannelId,
    ) -> impl Future<Output = Result<ChannelRef, PlatformError>> + Send {
        let guild = self.state.lock().unwrap().channels.get(&channel).copied();
        async move {
            match guild {
                Some(guild_id) => Ok(ChannelRef {
                    id: channel,
                    guild_id: Some(guild_id),
                    name: None,
                }),
                None => Err(PlatformError::Http {
                    status: 404,
                    message: "Unknown Channel".to_string(),
                }),
            }
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
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.created += 1;
        let handle = WebhookHandle {
            id: WebhookId(state.next_id),
            name: name.to_string(),
            channel_id: channel,
            token: Some(format!("token-{}", state.next_id)),
            owner_id: Some(BOT),
        };
        state.webhooks.push(handle.clone());
        async move { Ok(handle) }
    }

    fn move_webhook(
        &self,
        webhook: WebhookId,
        channel: ChannelId,
    ) -> impl Future<Output = Result<WebhookHandle, PlatformError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.moved += 1;
        let result = match state.webhooks.iter_mut().find(|h| h.id == webhook) {
            Some(hook) => {
                hook.channel_id = channel;
                Ok(hook.clone())
            }
            None => Err(PlatformError::Http {
                status: 404,
                message: "Unknown Webhook".to_string(),
            }),
        };
        async move { result }
    }

    fn execute_webhook(
        &self,
        webhook: &WebhookHandle,
        content: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let mut state = self.state.lock().unwrap();
        let live = state.webhooks.iter().find(|h| h.id == webhook.id).cloned();
        let result = match live {
            Some(hook) => {
                state
                    .sent
                    .push((hook.name.clone(), hook.channel_id, content.to_string()));
                Ok(())
            }
            None => Err(PlatformError::Http {
                status: 404,
                message: "Unknown Webhook".to_string(),
            }),
        };
        async move { result }
    }

    fn delete_webhook(
        &self,
        webhook: WebhookId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = if state.fail_deletes {
            Err(PlatformError::Http {
                status: 403,
                message: "Missing Permissions".to_string(),
            })
        } else {
            state.webhooks.retain(|h| h.id != webhook);
            Ok(())
        };
        async move { result }
    }

    fn fetch_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
    ) -> impl Future<Output = Result<ChannelMessage, PlatformError>> + Send {
        let found = self.state.lock().unwrap().messages.get(&message).cloned();
        async move {
            found.ok_or(PlatformError::Http {
                status: 404,
                message: "Unknown Message".to_string(),
            })
        }
    }

    fn fetch_avatar(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Option<AvatarImage>, PlatformError>> + Send {
        let found = url.starts_with("https://").then(|| AvatarImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: "image/png".to_string(),
        });
        async move { Ok(found) }
    }
}

/// Replies `reply-<n>` to every call, failing from call `fail_at` onwards.
pub(crate) struct ScriptedProvider {
    calls: AtomicUsize,
    fail_at: Option<usize>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    pub(crate) fn failing_at(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_at: Some(call),
        }
    }
}

impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.fail_at.is_some_and(|at| n >= at);
        let model = request.model.clone();
        async move {
            if fail {
                return Err(LlmError::Unreachable("connection refused".to_string()));
            }
            Ok(ChatResponse {
                model,
                message: Message::assistant(format!("reply-{n}")),
                total_duration_ns: None,
                eval_count: None,
            })
        }
    }

    fn list_models(&self) -> impl Future<Output = Result<Vec<String>, LlmError>> + Send {
        async { Ok(vec!["llama3.2".to_string(), "smollm:135m".to_string()]) }
    }
}
