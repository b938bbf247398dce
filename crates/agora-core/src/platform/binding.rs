//! IdentityBinder: maps agents onto reusable channel identities.
//!
//! `bind` is get-or-create-or-rebind:
//! 1. A handle tracked in the [`BindingRegistry`] for the same channel is
//!    returned as is; one for another channel is moved to the requested one.
//! 2. Otherwise every identity in the guild is searched for a bot-owned one
//!    with the same name (case-insensitive), moving it if needed.
//! 3. Otherwise a new identity is created with the fetched avatar.
//!
//! The result is at most one identity per `(bot, name)`, whichever channel
//! asked for it last. Names are a shared namespace: two conversations using
//! the same persona in different channels move the identity back and forth.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use agora_types::channel::{ChannelId, UserId, WebhookHandle};
use agora_types::error::{BindingError, PlatformError};

use crate::clock::Clock;

use super::registry::BindingRegistry;
use super::{AvatarImage, MessagingPlatform};

pub struct IdentityBinder<P: MessagingPlatform> {
    platform: Arc<P>,
    registry: Arc<BindingRegistry>,
    clock: Arc<dyn Clock>,
    owner: OnceCell<UserId>,
}

impl<P: MessagingPlatform> IdentityBinder<P> {
    pub fn new(platform: Arc<P>, registry: Arc<BindingRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            platform,
            registry,
            clock,
            owner: OnceCell::new(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    /// The bot account owning the identities; fetched once.
    pub async fn owner(&self) -> Result<UserId, PlatformError> {
        self.owner
            .get_or_try_init(|| self.platform.current_user())
            .await
            .copied()
    }

    /// Get, rebind or create the identity `name` for `channel`.
    ///
    /// `avatar_url` is only fetched when a new identity has to be created.
    pub async fn bind(
        &self,
        channel: ChannelId,
        name: &str,
        avatar_url: Option<&str>,
    ) -> Result<WebhookHandle, BindingError> {
        let bind_err = |source| BindingError::Bind {
            name: name.to_string(),
            source,
        };
        let owner = self.owner().await.map_err(bind_err)?;

        if let Some(known) = self.registry.get(owner, name) {
            if known.channel_id == channel {
                self.registry.touch(owner, name, self.clock.now());
                return Ok(known);
            }
            match self.relocate(&known, channel).await {
                Ok(moved) => {
                    self.registry.insert(owner, moved.clone(), self.clock.now());
                    return Ok(moved);
                }
                Err(err) if err.is_not_found() => {
                    debug!(identity = %name, "Tracked identity no longer exists");
                    self.registry.remove(owner, name);
                }
                Err(err) => return Err(bind_err(err)),
            }
        }

        let resolved = self
            .platform
            .get_channel(channel)
            .await
            .map_err(|source| BindingError::Resolve {
                channel: channel.to_string(),
                source,
            })?;
        let guild = resolved.guild_id.ok_or_else(|| BindingError::Resolve {
            channel: channel.to_string(),
            source: PlatformError::NotInGuild(channel.to_string()),
        })?;

        let wanted = name.to_lowercase();
        let existing = self
            .platform
            .guild_webhooks(guild)
            .await
            .map_err(bind_err)?
            .into_iter()
            .find(|hook| hook.is_owned_by(owner) && hook.name.to_lowercase() == wanted);

        let handle = match existing {
            Some(hook) if hook.channel_id == channel => hook,
            Some(hook) => self.relocate(&hook, channel).await.map_err(bind_err)?,
            None => {
                let avatar = match avatar_url {
                    Some(url) => self.fetch_avatar(url).await,
                    None => None,
                };
                let created = self
                    .platform
                    .create_webhook(channel, name, avatar.as_ref())
                    .await
                    .map_err(bind_err)?;
                info!(identity = %name, channel = %channel, "Created channel identity");
                created
            }
        };

        if handle.token.is_none() {
            return Err(BindingError::MissingToken(name.to_string()));
        }
        self.registry.insert(owner, handle.clone(), self.clock.now());
        Ok(handle)
    }

    /// Forget `stale`, which the platform no longer knows, and bind its name
    /// to `channel` again. Another process or a server admin may have
    /// deleted it.
    pub async fn replace(
        &self,
        channel: ChannelId,
        stale: &WebhookHandle,
        avatar_url: Option<&str>,
    ) -> Result<WebhookHandle, BindingError> {
        warn!(identity = %stale.name, webhook = %stale.id, "Tracked identity was deleted elsewhere");
        self.registry.forget_webhook(stale.id);
        self.bind(channel, &stale.name, avatar_url).await
    }

    /// Delete every bot-owned identity visible in `channel`.
    ///
    /// Individual deletion failures are logged and skipped. Returns the number
    /// of identities deleted.
    pub async fn unbind(&self, channel: ChannelId) -> Result<usize, BindingError> {
        let owner = self.owner().await.map_err(|source| BindingError::Resolve {
            channel: channel.to_string(),
            source,
        })?;
        let hooks = self
            .platform
            .channel_webhooks(channel)
            .await
            .map_err(|source| BindingError::Resolve {
                channel: channel.to_string(),
                source,
            })?;

        let mut deleted = 0;
        for hook in hooks.into_iter().filter(|h| h.is_owned_by(owner)) {
            match self.platform.delete_webhook(hook.id).await {
                Ok(()) => {
                    self.registry.forget_webhook(hook.id);
                    deleted += 1;
                }
                Err(err) => {
                    warn!(identity = %hook.name, error = %err, "Failed to delete channel identity");
                }
            }
        }
        info!(channel = %channel, deleted, "Cleaned up channel identities");
        Ok(deleted)
    }

    /// Delete tracked identities idle for longer than `max_idle`.
    ///
    /// A zero or negative `max_idle` disables expiry. Identities that are
    /// already gone are forgotten; other failures are retried on the next pass.
    pub async fn reconcile(&self, max_idle: Duration) -> usize {
        if max_idle <= Duration::zero() {
            return 0;
        }
        let stale = self.registry.stale(self.clock.now(), max_idle);
        let mut removed = 0;
        for hook in stale {
            match self.platform.delete_webhook(hook.id).await {
                Ok(()) => {
                    self.registry.forget_webhook(hook.id);
                    removed += 1;
                }
                Err(err) if err.is_not_found() => {
                    self.registry.forget_webhook(hook.id);
                }
                Err(err) => {
                    warn!(identity = %hook.name, error = %err, "Reconciliation could not delete identity");
                }
            }
        }
        if removed > 0 {
            info!(removed, "Reconciled idle channel identities");
        }
        removed
    }

    async fn relocate(
        &self,
        hook: &WebhookHandle,
        channel: ChannelId,
    ) -> Result<WebhookHandle, PlatformError> {
        info!(identity = %hook.name, from = %hook.channel_id, to = %channel, "Rebinding channel identity");
        let mut moved = self.platform.move_webhook(hook.id, channel).await?;
        if moved.token.is_none() {
            moved.token = hook.token.clone();
        }
        Ok(moved)
    }

    async fn fetch_avatar(&self, url: &str) -> Option<AvatarImage> {
        match self.platform.fetch_avatar(url).await {
            Ok(avatar) => avatar,
            Err(err) => {
                warn!(url = %url, error = %err, "Avatar fetch failed, creating identity without one");
                None
            }
        }
    }
}
