//! Messaging platform port and the identity-binding logic built on it.
//!
//! - `MessagingPlatform`: RPITIT trait implemented by the REST client in
//!   agora-infra
//! - `BindingRegistry`: process-wide `(owner, identity name) -> handle` map
//! - `IdentityBinder`: get-or-create-or-rebind of channel identities
//! - `chunk_message`: word-boundary splitting under the platform limit
//! - `ChannelDelivery`: routes an agent's reply through its identity

pub mod binding;
pub mod chunker;
pub mod delivery;
pub mod registry;

use agora_types::channel::{
    ChannelId, ChannelMessage, ChannelRef, GuildId, MessageId, UserId, WebhookHandle, WebhookId,
};
use agora_types::error::PlatformError;

pub use binding::IdentityBinder;
pub use chunker::chunk_message;
pub use delivery::ChannelDelivery;
pub use registry::BindingRegistry;

/// Raw avatar image uploaded when an identity is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Operations consumed from the messaging platform.
///
/// Implementations live in agora-infra (e.g., `DiscordClient`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait MessagingPlatform: Send + Sync {
    /// The bot's own account; owner of every identity it creates.
    fn current_user(
        &self,
    ) -> impl std::future::Future<Output = Result<UserId, PlatformError>> + Send;

    /// Resolve a channel and the guild it belongs to.
    fn get_channel(
        &self,
        channel: ChannelId,
    ) -> impl std::future::Future<Output = Result<ChannelRef, PlatformError>> + Send;

    /// All identities in a guild, across every channel.
    fn guild_webhooks(
        &self,
        guild: GuildId,
    ) -> impl std::future::Future<Output = Result<Vec<WebhookHandle>, PlatformError>> + Send;

    /// Identities visible in a single channel.
    fn channel_webhooks(
        &self,
        channel: ChannelId,
    ) -> impl std::future::Future<Output = Result<Vec<WebhookHandle>, PlatformError>> + Send;

    fn create_webhook(
        &self,
        channel: ChannelId,
        name: &str,
        avatar: Option<&AvatarImage>,
    ) -> impl std::future::Future<Output = Result<WebhookHandle, PlatformError>> + Send;

    /// Point an existing identity at another channel.
    fn move_webhook(
        &self,
        webhook: WebhookId,
        channel: ChannelId,
    ) -> impl std::future::Future<Output = Result<WebhookHandle, PlatformError>> + Send;

    /// Post `content` through an identity.
    fn execute_webhook(
        &self,
        webhook: &WebhookHandle,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;

    fn delete_webhook(
        &self,
        webhook: WebhookId,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;

    fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> impl std::future::Future<Output = Result<ChannelMessage, PlatformError>> + Send;

    /// Download an avatar image. `Ok(None)` when the server does not answer
    /// with 200.
    fn fetch_avatar(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Option<AvatarImage>, PlatformError>> + Send;
}
