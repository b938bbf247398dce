//! Configuration types for Agora.
//!
//! Two layers live here:
//! - [`AppConfig`]: process-wide runtime settings read from `agora.toml`.
//! - [`ConfigDocument`]: the persisted `config.json` holding every user's
//!   persona templates and generation settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::llm::SamplingOptions;
use crate::persona::PersonaTemplate;

/// Model used until a user picks another one.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Model advertised when the inference server cannot be queried.
pub const FALLBACK_MODEL: &str = "llama2";

/// System prompt shared by every agent until a user replaces it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are participating in a multi-agent conversation. \
Keep your responses short and relevant.\nAlways stay in character and respond from your \
specialized perspective while engaging meaningfully with other agents' messages.";

/// Key under which a user's configuration is stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(pub String);

impl UserKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserKey {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generation settings shared by all agents of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub system_prompt: String,
    pub parameters: SamplingOptions,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            parameters: SamplingOptions::default(),
        }
    }
}

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub agent_templates: Vec<PersonaTemplate>,
    #[serde(default)]
    pub bot_config: GenerationSettings,
}

/// Process-wide section of `config.json`.
///
/// Unknown keys are carried through untouched so that hand-edited entries
/// survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotSection {
    #[serde(default)]
    pub available_models: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The whole persisted `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub bot: BotSection,
    #[serde(default)]
    pub users: BTreeMap<UserKey, UserConfig>,
}

/// Runtime configuration for the Agora process.
///
/// Loaded from `{data_dir}/agora.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    /// Base URL of the Discord REST API.
    pub discord_api_base: String,
    /// Maximum characters per delivered message.
    pub message_limit: usize,
    /// Maximum entries kept in an agent's rolling history.
    pub history_limit: usize,
    /// HTTP timeout for outbound requests, in seconds.
    pub request_timeout_secs: u64,
    /// Idle time after which tracked identities are reconciled away.
    /// `0` keeps identities forever.
    pub binding_idle_secs: u64,
    /// Link attached to unexpected-failure notices.
    pub support_url: Option<String>,
    /// Source repository link attached to unexpected-failure notices.
    pub repository_url: Option<String>,
}

impl AppConfig {
    pub const DEFAULT_OLLAMA_URL: &'static str = "http://localhost:11434";
    pub const DEFAULT_DISCORD_API_BASE: &'static str = "https://discord.com/api/v10";
    pub const DEFAULT_MESSAGE_LIMIT: usize = 2000;
    pub const DEFAULT_HISTORY_LIMIT: usize = 10;
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_url: Self::DEFAULT_OLLAMA_URL.to_string(),
            discord_api_base: Self::DEFAULT_DISCORD_API_BASE.to_string(),
            message_limit: Self::DEFAULT_MESSAGE_LIMIT,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            request_timeout_secs: 300,
            binding_idle_secs: 0,
            support_url: None,
            repository_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_settings_defaults() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.model, "llama3.2");
        assert!(settings.system_prompt.starts_with("You are participating"));
        assert_eq!(settings.parameters, SamplingOptions::default());
    }

    #[test]
    fn test_config_document_parses_legacy_layout() {
        let json = r#"{
            "bot": {
                "presence": {"presence_text": "chatting"},
                "owner_ids": [],
                "available_models": ["llama3.2"]
            },
            "users": {
                "42": {
                    "agent_templates": [
                        {"agent_name": "tech", "personality": "p", "avatar_url": "u", "active": false}
                    ],
                    "bot_config": {"model": "smollm:135m", "parameters": {"top_k": 90}}
                }
            }
        }"#;
        let doc: ConfigDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.bot.available_models, vec!["llama3.2"]);
        assert!(doc.bot.extra.contains_key("presence"));

        let user = &doc.users[&UserKey::new("42")];
        assert!(!user.agent_templates[0].active);
        assert_eq!(user.bot_config.model, "smollm:135m");
        assert_eq!(user.bot_config.parameters.top_k, 90);
        assert_eq!(user.bot_config.parameters.num_ctx, 2048);
        assert_eq!(user.bot_config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_bot_section_keeps_unknown_keys() {
        let json = r#"{"owner_ids":[1,2],"available_models":[]}"#;
        let section: BotSection = serde_json::from_str(json).unwrap();
        let out = serde_json::to_string(&section).unwrap();
        assert!(out.contains("owner_ids"));
    }

    #[test]
    fn test_app_config_deserialize_with_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.message_limit, 2000);
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn test_app_config_deserialize_with_values() {
        let toml_str = r#"
ollama_url = "http://gpu-box:11434"
binding_idle_secs = 3600
support_url = "https://discord.gg/example"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.binding_idle_secs, 3600);
        assert_eq!(config.support_url.as_deref(), Some("https://discord.gg/example"));
        assert_eq!(config.discord_api_base, AppConfig::DEFAULT_DISCORD_API_BASE);
    }
}
