//! Discord REST API types and their conversion into platform types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_types::channel::{
    ChannelId, ChannelMessage, ChannelRef, GuildId, MessageAuthor, MessageId, UserId,
    WebhookHandle, WebhookId,
};

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordChannel {
    pub id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub name: Option<String>,
}

impl From<DiscordChannel> for ChannelRef {
    fn from(channel: DiscordChannel) -> Self {
        ChannelRef {
            id: channel.id,
            guild_id: channel.guild_id,
            name: channel.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordWebhook {
    pub id: WebhookId,
    pub name: Option<String>,
    pub channel_id: Option<ChannelId>,
    /// Only returned to the webhook's creator.
    pub token: Option<String>,
    /// The account that created the webhook.
    pub user: Option<DiscordUser>,
}

impl DiscordWebhook {
    /// `None` for webhooks without a channel (e.g. follower webhooks).
    pub fn into_handle(self) -> Option<WebhookHandle> {
        Some(WebhookHandle {
            id: self.id,
            name: self.name.unwrap_or_default(),
            channel_id: self.channel_id?,
            token: self.token,
            owner_id: self.user.map(|u| u.id),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessageReference {
    pub message_id: Option<MessageId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author: DiscordUser,
    #[serde(default)]
    pub content: String,
    pub webhook_id: Option<WebhookId>,
    pub message_reference: Option<DiscordMessageReference>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<DiscordMessage> for ChannelMessage {
    fn from(message: DiscordMessage) -> Self {
        ChannelMessage {
            id: message.id,
            channel_id: message.channel_id,
            guild_id: message.guild_id,
            author: MessageAuthor {
                id: message.author.id,
                name: message.author.username,
                bot: message.author.bot,
            },
            content: message.content,
            webhook_id: message.webhook_id,
            referenced_message_id: message.message_reference.and_then(|r| r.message_id),
            timestamp: message.timestamp,
        }
    }
}

/// Body of `POST /channels/{id}/webhooks`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWebhook<'a> {
    pub name: &'a str,
    /// `data:<content type>;base64,<bytes>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Body of `PATCH /webhooks/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ModifyWebhook {
    pub channel_id: ChannelId,
}

/// Body of `POST /webhooks/{id}/{token}`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteWebhook<'a> {
    pub content: &'a str,
}

/// Error body Discord returns with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: u64,
}
