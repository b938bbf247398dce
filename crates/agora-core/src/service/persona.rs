//! Persona management service.
//!
//! Every operation is one atomic update of the requesting user's stored
//! configuration: load, mutate a `PersonaRegistry`, save on success.

use std::sync::Arc;

use tracing::info;

use agora_types::config::UserKey;
use agora_types::error::PersonaError;
use agora_types::persona::PersonaTemplate;

use crate::persona::PersonaRegistry;
use crate::repository::ConfigRepository;

/// Result of replacing a registry with the built-in set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsLoaded {
    pub previous: usize,
    pub loaded: Vec<String>,
}

pub struct PersonaService<R: ConfigRepository> {
    repo: Arc<R>,
}

impl<R: ConfigRepository> PersonaService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    async fn mutate<T, F>(&self, user: &UserKey, apply: F) -> Result<T, PersonaError>
    where
        T: Send,
        F: FnOnce(&mut PersonaRegistry) -> Result<T, PersonaError> + Send,
    {
        self.repo
            .update_user(user, |config| {
                let mut registry = PersonaRegistry::new(std::mem::take(&mut config.agent_templates));
                let outcome = apply(&mut registry);
                config.agent_templates = registry.into_templates();
                outcome
            })
            .await?
    }

    pub async fn list(&self, user: &UserKey) -> Result<Vec<PersonaTemplate>, PersonaError> {
        Ok(self.repo.load_user(user).await?.agent_templates)
    }

    /// Create an active persona; the avatar defaults when omitted.
    pub async fn create(
        &self,
        user: &UserKey,
        name: &str,
        personality: &str,
        avatar_url: Option<String>,
    ) -> Result<PersonaTemplate, PersonaError> {
        let template = PersonaTemplate::new(name.trim(), personality.trim(), avatar_url);
        let created = self
            .mutate(user, move |registry| registry.create(template).cloned())
            .await?;
        info!(user = %user, persona = %created.name, "Persona created");
        Ok(created)
    }

    /// Delete a persona. The requested name is lower-cased first.
    pub async fn delete(&self, user: &UserKey, name: &str) -> Result<PersonaTemplate, PersonaError> {
        let name = name.trim().to_lowercase();
        let removed = self.mutate(user, |registry| registry.delete(&name)).await?;
        info!(user = %user, persona = %removed.name, "Persona deleted");
        Ok(removed)
    }

    pub async fn delete_all(&self, user: &UserKey) -> Result<usize, PersonaError> {
        let count = self
            .mutate(user, |registry| Ok(registry.delete_all()))
            .await?;
        info!(user = %user, count, "All personas deleted");
        Ok(count)
    }

    /// Flip a persona's active flag. Returns the new state.
    pub async fn toggle(&self, user: &UserKey, name: &str) -> Result<bool, PersonaError> {
        let active = self.mutate(user, |registry| registry.toggle(name)).await?;
        info!(user = %user, persona = %name, active, "Persona toggled");
        Ok(active)
    }

    pub async fn load_defaults(&self, user: &UserKey) -> Result<DefaultsLoaded, PersonaError> {
        self.mutate(user, |registry| {
            let previous = registry.load_defaults();
            Ok(DefaultsLoaded {
                previous,
                loaded: registry.list().iter().map(|t| t.name.clone()).collect(),
            })
        })
        .await
    }
}
