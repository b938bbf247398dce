//! Per-user configuration repository trait definition.

use agora_types::config::{UserConfig, UserKey};
use agora_types::error::RepositoryError;

/// Storage for every user's persona templates and generation settings.
///
/// Unknown users are materialized with the default personas and settings
/// on first access. `update_user` is an atomic read-modify-write: updates
/// for the same store are serialized, and the new state is written only
/// when the closure returns `Ok`.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ConfigRepository: Send + Sync {
    /// Load one user's configuration.
    fn load_user(
        &self,
        user: &UserKey,
    ) -> impl std::future::Future<Output = Result<UserConfig, RepositoryError>> + Send;

    /// Run `apply` against the user's current configuration and persist the
    /// result if it succeeds.
    ///
    /// The outer `Result` reports storage failures; the inner one is
    /// whatever `apply` returned.
    fn update_user<T, E, F>(
        &self,
        user: &UserKey,
        apply: F,
    ) -> impl std::future::Future<Output = Result<Result<T, E>, RepositoryError>> + Send
    where
        T: Send,
        E: Send,
        F: FnOnce(&mut UserConfig) -> Result<T, E> + Send;

    /// Models last advertised by the inference server.
    fn available_models(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;

    fn set_available_models(
        &self,
        models: Vec<String>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
