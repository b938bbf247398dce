//! DiscordClient -- concrete [`MessagingPlatform`] implementation over the
//! Discord REST API.
//!
//! The bot token is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header. Webhook execution authenticates
//! with the webhook's own token instead.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use agora_core::platform::{AvatarImage, MessagingPlatform};
use agora_types::channel::{
    ChannelId, ChannelMessage, ChannelRef, GuildId, MessageId, UserId, WebhookHandle, WebhookId,
};
use agora_types::error::PlatformError;

use super::types::{
    CreateWebhook, DiscordChannel, DiscordErrorBody, DiscordMessage, DiscordUser, DiscordWebhook,
    ExecuteWebhook, ModifyWebhook,
};

/// No `Debug`: the struct holds the bot token.
pub struct DiscordClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<SecretString>,
}

impl DiscordClient {
    pub fn new(
        api_base: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agora (", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .map_err(|e| PlatformError::Request(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// A request carrying the bot token.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, PlatformError> {
        let token = self.token.as_ref().ok_or(PlatformError::MissingToken)?;
        Ok(self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bot {}", token.expose_secret())))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, PlatformError> {
        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Deserialization(e.to_string()))
    }

    async fn send_empty(request: RequestBuilder) -> Result<(), PlatformError> {
        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Request(e.to_string()))?;
        check_status(response).await.map(|_| ())
    }

    fn handles(hooks: Vec<DiscordWebhook>) -> Vec<WebhookHandle> {
        hooks.into_iter().filter_map(DiscordWebhook::into_handle).collect()
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DiscordErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    Err(PlatformError::Http {
        status: status.as_u16(),
        message,
    })
}

/// `data:` URI accepted by Discord for avatar uploads.
pub fn avatar_data_uri(avatar: &AvatarImage) -> String {
    format!(
        "data:{};base64,{}",
        avatar.content_type,
        STANDARD.encode(&avatar.bytes)
    )
}

fn missing_channel(id: WebhookId) -> PlatformError {
    PlatformError::Deserialization(format!("webhook {id} has no channel"))
}

impl MessagingPlatform for DiscordClient {
    async fn current_user(&self) -> Result<UserId, PlatformError> {
        let user: DiscordUser = Self::send_json(self.authed(Method::GET, "/users/@me")?).await?;
        Ok(user.id)
    }

    async fn get_channel(&self, channel: ChannelId) -> Result<ChannelRef, PlatformError> {
        let found: DiscordChannel =
            Self::send_json(self.authed(Method::GET, &format!("/channels/{channel}"))?).await?;
        Ok(found.into())
    }

    async fn guild_webhooks(&self, guild: GuildId) -> Result<Vec<WebhookHandle>, PlatformError> {
        let hooks: Vec<DiscordWebhook> =
            Self::send_json(self.authed(Method::GET, &format!("/guilds/{guild}/webhooks"))?)
                .await?;
        Ok(Self::handles(hooks))
    }

    async fn channel_webhooks(
        &self,
        channel: ChannelId,
    ) -> Result<Vec<WebhookHandle>, PlatformError> {
        let hooks: Vec<DiscordWebhook> =
            Self::send_json(self.authed(Method::GET, &format!("/channels/{channel}/webhooks"))?)
                .await?;
        Ok(Self::handles(hooks))
    }

    async fn create_webhook(
        &self,
        channel: ChannelId,
        name: &str,
        avatar: Option<&AvatarImage>,
    ) -> Result<WebhookHandle, PlatformError> {
        let body = CreateWebhook {
            name,
            avatar: avatar.map(avatar_data_uri),
        };
        let hook: DiscordWebhook = Self::send_json(
            self.authed(Method::POST, &format!("/channels/{channel}/webhooks"))?
                .json(&body),
        )
        .await?;
        let id = hook.id;
        hook.into_handle().ok_or_else(|| missing_channel(id))
    }

    async fn move_webhook(
        &self,
        webhook: WebhookId,
        channel: ChannelId,
    ) -> Result<WebhookHandle, PlatformError> {
        let hook: DiscordWebhook = Self::send_json(
            self.authed(Method::PATCH, &format!("/webhooks/{webhook}"))?
                .json(&ModifyWebhook { channel_id: channel }),
        )
        .await?;
        hook.into_handle().ok_or_else(|| missing_channel(webhook))
    }

    async fn execute_webhook(
        &self,
        webhook: &WebhookHandle,
        content: &str,
    ) -> Result<(), PlatformError> {
        let token = webhook
            .token
            .as_deref()
            .ok_or_else(|| PlatformError::Request(format!("webhook {} has no token", webhook.id)))?;
        let request = self
            .client
            .post(self.url(&format!("/webhooks/{}/{token}", webhook.id)))
            .query(&[("wait", "true")])
            .json(&ExecuteWebhook { content });
        Self::send_empty(request).await
    }

    async fn delete_webhook(&self, webhook: WebhookId) -> Result<(), PlatformError> {
        Self::send_empty(self.authed(Method::DELETE, &format!("/webhooks/{webhook}"))?).await
    }

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<ChannelMessage, PlatformError> {
        let found: DiscordMessage = Self::send_json(
            self.authed(Method::GET, &format!("/channels/{channel}/messages/{message}"))?,
        )
        .await?;
        Ok(found.into())
    }

    async fn fetch_avatar(&self, url: &str) -> Result<Option<AvatarImage>, PlatformError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url, error = %err, "Avatar download failed");
                return Ok(None);
            }
        };
        if response.status() != StatusCode::OK {
            tracing::warn!(url, status = %response.status(), "Avatar not available");
            return Ok(None);
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        match response.bytes().await {
            Ok(bytes) => Ok(Some(AvatarImage {
                bytes: bytes.to_vec(),
                content_type,
            })),
            Err(err) => {
                tracing::warn!(url, error = %err, "Avatar body could not be read");
                Ok(None)
            }
        }
    }
}
