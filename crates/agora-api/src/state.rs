//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over the platform/repository ports, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use agora_core::clock::SystemClock;
use agora_core::llm::box_provider::BoxChatProvider;
use agora_core::platform::{BindingRegistry, IdentityBinder};
use agora_core::service::{ConversationService, PersonaService, SettingsService};
use agora_infra::config::{USER_CONFIG_FILE, load_app_config, resolve_data_dir};
use agora_infra::discord::DiscordClient;
use agora_infra::ollama::OllamaClient;
use agora_infra::report::ErrorReporter;
use agora_infra::storage::JsonConfigRepository;
use agora_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcretePersonaService = PersonaService<JsonConfigRepository>;

pub type ConcreteSettingsService = SettingsService<JsonConfigRepository>;

pub type ConcreteConversationService = ConversationService<DiscordClient, JsonConfigRepository>;

/// Secrets read from the environment at startup.
#[derive(Default)]
pub struct Secrets {
    pub discord_token: Option<SecretString>,
    pub errors_webhook: Option<SecretString>,
    pub api_key: Option<SecretString>,
}

impl Secrets {
    /// `DISCORD_TOKEN`, or `DISCORD_TEST_TOKEN` with `--test`.
    pub fn from_env(test_token: bool) -> Self {
        let token_var = if test_token {
            "DISCORD_TEST_TOKEN"
        } else {
            "DISCORD_TOKEN"
        };
        Self {
            discord_token: secret_var(token_var),
            errors_webhook: secret_var("ERRORS_WEBHOOK"),
            api_key: secret_var("AGORA_API_KEY"),
        }
    }
}

fn secret_var(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub persona_service: Arc<ConcretePersonaService>,
    pub settings_service: Arc<ConcreteSettingsService>,
    pub conversation_service: Arc<ConcreteConversationService>,
    pub reporter: Arc<ErrorReporter>,
    pub config: Arc<AppConfig>,
    pub api_key: Option<Arc<SecretString>>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load configuration and wire services.
    pub async fn init(test_token: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_app_config(&data_dir).await;
        let secrets = Secrets::from_env(test_token);
        if secrets.discord_token.is_none() {
            tracing::warn!("No Discord token configured; channel commands will fail");
        }
        Self::build(data_dir, config, secrets)
    }

    /// Wire services from already-resolved configuration.
    pub fn build(data_dir: PathBuf, config: AppConfig, secrets: Secrets) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));

        let ollama = OllamaClient::new(&config.ollama_url, timeout)?;
        let provider = Arc::new(BoxChatProvider::new(ollama));

        let discord = DiscordClient::new(&config.discord_api_base, secrets.discord_token, timeout)?;
        let binder = Arc::new(IdentityBinder::new(
            Arc::new(discord),
            Arc::new(BindingRegistry::new()),
            Arc::new(SystemClock),
        ));

        let repo = Arc::new(JsonConfigRepository::new(data_dir.join(USER_CONFIG_FILE)));

        let persona_service = PersonaService::new(repo.clone());
        let settings_service = SettingsService::new(repo.clone(), provider.clone());
        let conversation_service = ConversationService::new(provider, binder, repo, &config);
        let reporter = ErrorReporter::new(&data_dir, secrets.errors_webhook, &config);

        Ok(Self {
            persona_service: Arc::new(persona_service),
            settings_service: Arc::new(settings_service),
            conversation_service: Arc::new(conversation_service),
            reporter: Arc::new(reporter),
            config: Arc::new(config),
            api_key: secrets.api_key.map(Arc::new),
            data_dir,
        })
    }
}
