//! Per-user generation settings: model, system prompt and sampling options.

use std::sync::Arc;

use tracing::{info, warn};

use agora_types::config::{DEFAULT_SYSTEM_PROMPT, FALLBACK_MODEL, GenerationSettings, UserKey};
use agora_types::error::SettingsError;
use agora_types::llm::{SamplingOptions, SamplingUpdate};

use crate::llm::box_provider::BoxChatProvider;
use crate::repository::ConfigRepository;

pub struct SettingsService<R: ConfigRepository> {
    repo: Arc<R>,
    provider: Arc<BoxChatProvider>,
}

impl<R: ConfigRepository> SettingsService<R> {
    pub fn new(repo: Arc<R>, provider: Arc<BoxChatProvider>) -> Self {
        Self { repo, provider }
    }

    pub async fn settings(&self, user: &UserKey) -> Result<GenerationSettings, SettingsError> {
        Ok(self.repo.load_user(user).await?.bot_config)
    }

    /// Apply any subset of sampling parameters. Returns the full set.
    pub async fn set_parameters(
        &self,
        user: &UserKey,
        update: SamplingUpdate,
    ) -> Result<SamplingOptions, SettingsError> {
        validate(&update)?;
        let options = self
            .repo
            .update_user(user, |config| {
                update.apply(&mut config.bot_config.parameters);
                Ok::<_, SettingsError>(config.bot_config.parameters.clone())
            })
            .await??;
        info!(user = %user, ?options, "Sampling parameters updated");
        Ok(options)
    }

    /// Replace the system prompt; `None` restores the default.
    pub async fn set_system_prompt(
        &self,
        user: &UserKey,
        prompt: Option<String>,
    ) -> Result<String, SettingsError> {
        let prompt = prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let stored = self
            .repo
            .update_user(user, move |config| {
                config.bot_config.system_prompt = prompt;
                Ok::<_, SettingsError>(config.bot_config.system_prompt.clone())
            })
            .await??;
        info!(user = %user, "System prompt updated");
        Ok(stored)
    }

    /// Switch the model used by all of the user's agents.
    ///
    /// The name is checked against the models the inference server
    /// advertises. An empty advertisement, or a server that cannot be
    /// reached, accepts any name.
    pub async fn set_model(&self, user: &UserKey, model: &str) -> Result<String, SettingsError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(SettingsError::InvalidParameter("model name cannot be empty".to_string()));
        }
        match self.provider.list_models().await {
            Ok(available) => {
                self.repo.set_available_models(available.clone()).await?;
                if !available.is_empty() && !available.iter().any(|m| model_matches(m, model)) {
                    return Err(SettingsError::UnknownModel {
                        model: model.to_string(),
                        available,
                    });
                }
            }
            Err(err) => {
                warn!(error = %err, model = %model, "Could not list models, accepting model unchecked");
            }
        }

        let model = model.to_string();
        let stored = self
            .repo
            .update_user(user, move |config| {
                config.bot_config.model = model;
                Ok::<_, SettingsError>(config.bot_config.model.clone())
            })
            .await??;
        info!(user = %user, model = %stored, "Model updated");
        Ok(stored)
    }

    /// Ask the inference server for its models and store the list.
    ///
    /// Falls back to a single default model when the server is unreachable.
    pub async fn refresh_models(&self) -> Result<Vec<String>, SettingsError> {
        let models = match self.provider.list_models().await {
            Ok(models) => models,
            Err(err) => {
                warn!(error = %err, "Could not list models, using fallback");
                vec![FALLBACK_MODEL.to_string()]
            }
        };
        self.repo.set_available_models(models.clone()).await?;
        Ok(models)
    }

    pub async fn available_models(&self) -> Result<Vec<String>, SettingsError> {
        Ok(self.repo.available_models().await?)
    }
}

/// `llama3.2` matches an advertised `llama3.2:latest`.
fn model_matches(advertised: &str, requested: &str) -> bool {
    advertised == requested
        || advertised
            .strip_suffix(":latest")
            .is_some_and(|base| base == requested)
}

fn validate(update: &SamplingUpdate) -> Result<(), SettingsError> {
    if update.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)) {
        return Err(SettingsError::InvalidParameter(
            "temperature must be between 0.0 and 2.0".to_string(),
        ));
    }
    if update.top_p.is_some_and(|p| !(0.0..=1.0).contains(&p)) {
        return Err(SettingsError::InvalidParameter(
            "top_p must be between 0.0 and 1.0".to_string(),
        ));
    }
    if update.num_ctx == Some(0) {
        return Err(SettingsError::InvalidParameter(
            "num_ctx must be positive".to_string(),
        ));
    }
    if update.repeat_penalty.is_some_and(|r| r < 0.0) {
        return Err(SettingsError::InvalidParameter(
            "repeat_penalty must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatProvider;
    use crate::repository::InMemoryConfigRepository;
    use crate::testing::ScriptedProvider;
    use agora_types::llm::{ChatRequest, ChatResponse, LlmError};
    use std::future::Future;

    struct OfflineProvider;

    impl ChatProvider for OfflineProvider {
        fn name(&self) -> &str {
            "offline"
        }

        fn chat(
            &self,
            _request: &ChatRequest,
        ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send {
            async { Err(LlmError::Unreachable("offline".to_string())) }
        }

        fn list_models(&self) -> impl Future<Output = Result<Vec<String>, LlmError>> + Send {
            async { Err(LlmError::Unreachable("offline".to_string())) }
        }
    }

    fn service() -> (SettingsService<InMemoryConfigRepository>, Arc<InMemoryConfigRepository>) {
        let repo = Arc::new(InMemoryConfigRepository::new());
        let provider = Arc::new(BoxChatProvider::new(ScriptedProvider::new()));
        (SettingsService::new(repo.clone(), provider), repo)
    }

    #[tokio::test]
    async fn test_set_parameters_updates_subset() {
        let (svc, _) = service();
        let user = UserKey::new("1");
        let update = SamplingUpdate {
            temperature: Some(1.2),
            num_predict: Some(300),
            ..Default::default()
        };
        let options = svc.set_parameters(&user, update).await.unwrap();
        assert!((options.temperature - 1.2).abs() < f64::EPSILON);
        assert_eq!(options.num_predict, 300);
        assert_eq!(options.top_k, 40);
        assert_eq!(svc.settings(&user).await.unwrap().parameters, options);
    }

    #[tokio::test]
    async fn test_set_parameters_rejects_out_of_range() {
        let (svc, _) = service();
        let update = SamplingUpdate {
            top_p: Some(1.5),
            ..Default::default()
        };
        let err = svc.set_parameters(&UserKey::new("1"), update).await.unwrap_err();
        assert!(matches!(err, SettingsError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_system_prompt_reset() {
        let (svc, _) = service();
        let user = UserKey::new("1");
        svc.set_system_prompt(&user, Some("Be terse.".to_string())).await.unwrap();
        assert_eq!(svc.settings(&user).await.unwrap().system_prompt, "Be terse.");

        let reset = svc.set_system_prompt(&user, None).await.unwrap();
        assert_eq!(reset, DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_set_model_validates_against_server() {
        let (svc, repo) = service();
        let user = UserKey::new("1");

        assert_eq!(svc.set_model(&user, "smollm:135m").await.unwrap(), "smollm:135m");
        let err = svc.set_model(&user, "gpt-4").await.unwrap_err();
        assert!(matches!(err, SettingsError::UnknownModel { .. }));
        assert_eq!(repo.snapshot().await.bot.available_models.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_server_falls_back() {
        let repo = Arc::new(InMemoryConfigRepository::new());
        let svc = SettingsService::new(repo, Arc::new(BoxChatProvider::new(OfflineProvider)));
        assert_eq!(svc.refresh_models().await.unwrap(), vec!["llama2"]);
        assert_eq!(svc.available_models().await.unwrap(), vec!["llama2"]);
    }

    #[tokio::test]
    async fn test_set_model_unchecked_when_server_unreachable() {
        let repo = Arc::new(InMemoryConfigRepository::new());
        let svc = SettingsService::new(repo, Arc::new(BoxChatProvider::new(OfflineProvider)));
        let user = UserKey::new("1");

        assert_eq!(svc.set_model(&user, "llama3.2").await.unwrap(), "llama3.2");
        assert_eq!(svc.settings(&user).await.unwrap().model, "llama3.2");
    }

    #[test]
    fn test_model_matches_latest_tag() {
        assert!(model_matches("llama3.2:latest", "llama3.2"));
        assert!(model_matches("llama3.2", "llama3.2"));
        assert!(!model_matches("llama3.2:1b", "llama3.2"));
    }
}
