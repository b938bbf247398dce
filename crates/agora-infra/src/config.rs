//! Runtime configuration loader for Agora.
//!
//! Reads `agora.toml` from the data directory (`./data` unless
//! `AGORA_DATA_DIR` says otherwise) and deserializes it into [`AppConfig`].
//! Falls back to sensible defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use agora_types::config::AppConfig;

/// File name of the runtime configuration inside the data directory.
pub const APP_CONFIG_FILE: &str = "agora.toml";

/// File name of the per-user configuration store inside the data directory.
pub const USER_CONFIG_FILE: &str = "config.json";

/// Resolve the data directory.
///
/// Priority:
/// 1. `AGORA_DATA_DIR` environment variable
/// 2. `./data`
pub fn resolve_data_dir() -> PathBuf {
    std::env::var("AGORA_DATA_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Load runtime configuration from `{data_dir}/agora.toml`, then apply
/// environment overrides.
///
/// - If the file does not exist, starts from [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and uses the default.
/// - `OLLAMA_HOST` replaces `ollama_url` when set.
pub async fn load_app_config(data_dir: &Path) -> AppConfig {
    let config = read_config_file(data_dir).await;
    apply_env_overrides(config, std::env::var("OLLAMA_HOST").ok())
}

async fn read_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join(APP_CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {APP_CONFIG_FILE} found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Apply the `OLLAMA_HOST` override. A bare `host:port` gets `http://`.
pub fn apply_env_overrides(mut config: AppConfig, ollama_host: Option<String>) -> AppConfig {
    if let Some(host) = ollama_host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()) {
        config.ollama_url = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("http://{host}")
        };
    }
    if config.message_limit == 0 {
        tracing::warn!(
            "message_limit must be positive, using {}",
            AppConfig::DEFAULT_MESSAGE_LIMIT
        );
        config.message_limit = AppConfig::DEFAULT_MESSAGE_LIMIT;
    }
    config
}
