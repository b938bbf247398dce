//! Process-wide registry of channel identities.
//!
//! Identities are keyed by `(owner, lower-cased name)`: one live handle per
//! name per bot account, whichever channel it currently points at. Binding
//! the same name for a different channel rebinds the existing entry.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use agora_types::channel::{ChannelId, UserId, WebhookHandle, WebhookId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BindingKey {
    owner: UserId,
    name: String,
}

impl BindingKey {
    fn new(owner: UserId, name: &str) -> Self {
        Self {
            owner,
            name: name.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone)]
struct TrackedBinding {
    handle: WebhookHandle,
    last_used: DateTime<Utc>,
}

/// Concurrent map of known identity handles.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: DashMap<BindingKey, TrackedBinding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: UserId, name: &str) -> Option<WebhookHandle> {
        self.bindings
            .get(&BindingKey::new(owner, name))
            .map(|entry| entry.handle.clone())
    }

    /// Track `handle`, replacing any previous handle under the same name.
    pub fn insert(&self, owner: UserId, handle: WebhookHandle, now: DateTime<Utc>) {
        let key = BindingKey::new(owner, &handle.name);
        self.bindings.insert(
            key,
            TrackedBinding {
                handle,
                last_used: now,
            },
        );
    }

    /// Mark a handle as used. Returns false if it is not tracked.
    pub fn touch(&self, owner: UserId, name: &str, now: DateTime<Utc>) -> bool {
        match self.bindings.get_mut(&BindingKey::new(owner, name)) {
            Some(mut entry) => {
                entry.last_used = now;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, owner: UserId, name: &str) -> Option<WebhookHandle> {
        self.bindings
            .remove(&BindingKey::new(owner, name))
            .map(|(_, tracked)| tracked.handle)
    }

    /// Forget a handle by id, whatever name it is tracked under.
    pub fn forget_webhook(&self, id: WebhookId) {
        self.bindings.retain(|_, tracked| tracked.handle.id != id);
    }

    /// Forget every handle pointing at `channel`.
    pub fn forget_channel(&self, channel: ChannelId) -> usize {
        let before = self.bindings.len();
        self.bindings
            .retain(|_, tracked| tracked.handle.channel_id != channel);
        before - self.bindings.len()
    }

    /// Handles unused for longer than `max_idle` at `now`.
    pub fn stale(&self, now: DateTime<Utc>, max_idle: Duration) -> Vec<WebhookHandle> {
        self.bindings
            .iter()
            .filter(|entry| now - entry.last_used > max_idle)
            .map(|entry| entry.handle.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
