//! In-memory ConfigRepository, used by tests and dry runs.

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use agora_types::config::{ConfigDocument, GenerationSettings, UserConfig, UserKey};
use agora_types::error::RepositoryError;

use crate::persona::default_personas;

use super::config::ConfigRepository;

/// Holds the whole document behind one async mutex.
#[derive(Debug, Default)]
pub struct InMemoryConfigRepository {
    document: Mutex<ConfigDocument>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: ConfigDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    pub async fn snapshot(&self) -> ConfigDocument {
        self.document.lock().await.clone()
    }
}

/// The configuration given to a user seen for the first time.
pub fn default_user_config() -> UserConfig {
    UserConfig {
        agent_templates: default_personas(),
        bot_config: GenerationSettings::default(),
    }
}

fn materialize<'a>(
    users: &'a mut BTreeMap<UserKey, UserConfig>,
    user: &UserKey,
) -> &'a mut UserConfig {
    users
        .entry(user.clone())
        .or_insert_with(default_user_config)
}

impl ConfigRepository for InMemoryConfigRepository {
    async fn load_user(&self, user: &UserKey) -> Result<UserConfig, RepositoryError> {
        let mut document = self.document.lock().await;
        Ok(materialize(&mut document.users, user).clone())
    }

    async fn update_user<T, E, F>(
        &self,
        user: &UserKey,
        apply: F,
    ) -> Result<Result<T, E>, RepositoryError>
    where
        T: Send,
        E: Send,
        F: FnOnce(&mut UserConfig) -> Result<T, E> + Send,
    {
        let mut document = self.document.lock().await;
        let mut working = materialize(&mut document.users, user).clone();
        let outcome = apply(&mut working);
        if outcome.is_ok() {
            document.users.insert(user.clone(), working);
        }
        Ok(outcome)
    }

    async fn available_models(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.document.lock().await.bot.available_models.clone())
    }

    async fn set_available_models(&self, models: Vec<String>) -> Result<(), RepositoryError> {
        self.document.lock().await.bot.available_models = models;
        Ok(())
    }
}
