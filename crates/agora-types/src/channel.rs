//! Messaging-platform identifiers and the handles Agora works with.
//!
//! Platform ids are 64-bit snowflakes. The wire format carries them as
//! strings, so they serialize as strings but accept either form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name)
                    .map_err(|_| format!("invalid {}: '{s}'", stringify!($name)))
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match RawSnowflake::deserialize(deserializer)? {
                    RawSnowflake::Number(n) => Ok($name(n)),
                    RawSnowflake::Text(s) => s.parse().map_err(serde::de::Error::custom),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Number(u64),
    Text(String),
}

snowflake!(
    /// A text channel.
    ChannelId
);
snowflake!(
    /// A guild (server); the scope in which webhooks are looked up.
    GuildId
);
snowflake!(
    /// A user or bot account.
    UserId
);
snowflake!(
    /// A channel-bound webhook identity.
    WebhookId
);
snowflake!(
    /// A message.
    MessageId
);

/// A channel resolved to its owning guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: ChannelId,
    /// `None` for DM channels, where webhooks are unavailable.
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A destination-bound pseudo-identity (webhook) through which an agent
/// posts into a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookHandle {
    pub id: WebhookId,
    pub name: String,
    pub channel_id: ChannelId,
    /// Execution token; only present for webhooks owned by this bot.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Account that created the webhook.
    pub owner_id: Option<UserId>,
}

impl WebhookHandle {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == Some(user)
    }
}

/// Author of a platform message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

/// A message as seen on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub author: MessageAuthor,
    #[serde(default)]
    pub content: String,
    /// Set when the message was posted through a webhook.
    #[serde(default)]
    pub webhook_id: Option<WebhookId>,
    /// Message this one replies to.
    #[serde(default)]
    pub referenced_message_id: Option<MessageId>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
