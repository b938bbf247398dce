//! JSON-file configuration repository.
//!
//! Layout of `{data_dir}/config.json`:
//! ```text
//! {
//!   "bot":   { "available_models": [...], ...untouched keys },
//!   "users": { "<user id>": { "agent_templates": [...], "bot_config": {...} } }
//! }
//! ```
//!
//! The file is read on every access and rewritten whole on every change.
//! All access goes through one async mutex, so each `update_user` is an
//! atomic read-modify-write within the process. Writes go to a sibling
//! temp file that is then renamed over the original.
//!
//! Reading also repairs the document: unknown users get the default
//! personas and settings, missing keys are back-filled from defaults, and
//! an unparseable file is replaced by an empty document. Any repair is
//! written back immediately.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::sync::Mutex;

use agora_core::repository::ConfigRepository;
use agora_core::repository::memory::default_user_config;
use agora_types::config::{ConfigDocument, UserConfig, UserKey};
use agora_types::error::RepositoryError;

pub struct JsonConfigRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

/// A document as read from disk, and whether it differs from the file.
struct Loaded {
    document: ConfigDocument,
    dirty: bool,
}

impl JsonConfigRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document, repaired and saved if needed.
    pub async fn document(&self) -> Result<ConfigDocument, RepositoryError> {
        let _guard = self.lock.lock().await;
        let loaded = self.read().await?;
        if loaded.dirty {
            self.write(&loaded.document).await?;
        }
        Ok(loaded.document)
    }

    async fn read(&self) -> Result<Loaded, RepositoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, starting empty", self.path.display());
                return Ok(Loaded {
                    document: ConfigDocument::default(),
                    dirty: true,
                });
            }
            Err(err) => return Err(RepositoryError::Io(err.to_string())),
        };

        let parsed = serde_json::from_str::<serde_json::Value>(&content).and_then(|raw| {
            let document = ConfigDocument::deserialize(&raw)?;
            Ok((raw, document))
        });
        match parsed {
            Ok((raw, document)) => {
                let normalized = serde_json::to_value(&document)
                    .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
                let dirty = normalized != raw;
                if dirty {
                    tracing::info!("Back-filling missing keys in {}", self.path.display());
                }
                Ok(Loaded { document, dirty })
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, replacing with defaults",
                    self.path.display()
                );
                Ok(Loaded {
                    document: ConfigDocument::default(),
                    dirty: true,
                })
            }
        }
    }

    async fn write(&self, document: &ConfigDocument) -> Result<(), RepositoryError> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Io(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        tracing::debug!("Saved {}", self.path.display());
        Ok(())
    }
}

/// Insert defaults for a user seen for the first time. Returns true if
/// anything was added.
fn materialize(document: &mut ConfigDocument, user: &UserKey) -> bool {
    if document.users.contains_key(user) {
        return false;
    }
    tracing::info!(user = %user, "Creating default configuration for new user");
    document.users.insert(user.clone(), default_user_config());
    true
}

impl ConfigRepository for JsonConfigRepository {
    async fn load_user(&self, user: &UserKey) -> Result<UserConfig, RepositoryError> {
        let _guard = self.lock.lock().await;
        let Loaded { mut document, dirty } = self.read().await?;
        let added = materialize(&mut document, user);
        if dirty || added {
            self.write(&document).await?;
        }
        document
            .users
            .get(user)
            .cloned()
            .ok_or(RepositoryError::NotFound)
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
        let _guard = self.lock.lock().await;
        let Loaded { mut document, dirty } = self.read().await?;
        let added = materialize(&mut document, user);

        let Some(config) = document.users.get_mut(user) else {
            return Err(RepositoryError::NotFound);
        };
        let mut working = config.clone();
        let outcome = apply(&mut working);

        let changed = outcome.is_ok() && working != *config;
        if changed {
            *config = working;
        }
        if dirty || added || changed {
            self.write(&document).await?;
        }
        Ok(outcome)
    }

    async fn available_models(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.document().await?.bot.available_models)
    }

    async fn set_available_models(&self, models: Vec<String>) -> Result<(), RepositoryError> {
        let _guard = self.lock.lock().await;
        let Loaded { mut document, dirty } = self.read().await?;
        if dirty || document.bot.available_models != models {
            document.bot.available_models = models;
            self.write(&document).await?;
        }
        Ok(())
    }
}
