//! Persona templates and the identities of agents instantiated from them.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Avatar used when a persona is created without one.
pub const DEFAULT_AVATAR_URL: &str = "https://thispersondoesnotexist.com/";

/// Prefix shared by every agent identity name.
const AGENT_PREFIX: &str = "agent_";

/// A named personality that agents can be instantiated from.
///
/// Serialized with the `agent_name` key to stay compatible with existing
/// `config.json` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaTemplate {
    /// Unique key within a registry (case-sensitive).
    #[serde(rename = "agent_name")]
    pub name: String,
    /// Personality text appended to the global system prompt.
    pub personality: String,
    /// Image fetched and uploaded as the identity avatar.
    pub avatar_url: String,
    /// Only active personas take part in simulations.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PersonaTemplate {
    /// Create an active persona, falling back to the default avatar.
    pub fn new(
        name: impl Into<String>,
        personality: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            personality: personality.into(),
            avatar_url: avatar_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            active: true,
        }
    }

    /// Status label used in listings.
    pub fn status_label(&self) -> &'static str {
        if self.active { "Active" } else { "Inactive" }
    }
}

/// Structured identity of a live agent.
///
/// Carries the persona key it was built from alongside the display name
/// used for its chat identity, so nothing has to be recovered by splitting
/// the display name apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Name of the persona template this agent was built from.
    pub persona_key: String,
    /// Name shown on the chat identity (e.g. `Agent_politics`).
    pub display_name: String,
}

impl AgentIdentity {
    /// Derive the identity for a persona name.
    ///
    /// The display name is `agent_<persona>` with the first character
    /// upper-cased and the rest lower-cased.
    pub fn for_persona(persona: &str) -> Self {
        Self {
            persona_key: persona.to_string(),
            display_name: capitalize(&format!("{AGENT_PREFIX}{persona}")),
        }
    }

    /// Recover an identity from a display name seen on the platform.
    ///
    /// Only used for messages that arrive from the outside (replies to a
    /// webhook message), where the display name is all we have.
    pub fn from_display_name(display_name: &str) -> Self {
        let lowered = display_name.to_lowercase();
        let persona_key = lowered
            .strip_prefix(AGENT_PREFIX)
            .unwrap_or(&lowered)
            .to_string();
        Self {
            persona_key,
            display_name: display_name.to_string(),
        }
    }

    /// Case-insensitive comparison against a platform-side name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.display_name.to_lowercase() == name.to_lowercase()
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
