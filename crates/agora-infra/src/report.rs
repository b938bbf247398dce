//! Unexpected-failure reporting.
//!
//! The last unexpected failure is written to `{data_dir}/lastError.log`
//! and, when an operator webhook is configured (`ERRORS_WEBHOOK`), posted
//! there along with the support link. Reporting never fails the caller:
//! problems are logged and dropped.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use agora_types::config::AppConfig;

pub const ERROR_LOG_FILE: &str = "lastError.log";

/// Where a failure happened: the command and the options it ran with.
#[derive(Debug, Clone, Default)]
pub struct FailureContext {
    pub command: String,
    pub user: Option<String>,
    pub options: Vec<(String, String)>,
}

impl FailureContext {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.options.push((name.into(), value.to_string()));
        self
    }
}

pub struct ErrorReporter {
    client: reqwest::Client,
    log_path: PathBuf,
    webhook_url: Option<SecretString>,
    support_url: Option<String>,
    repository_url: Option<String>,
}

impl ErrorReporter {
    pub fn new(data_dir: &Path, webhook_url: Option<SecretString>, config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            log_path: data_dir.join(ERROR_LOG_FILE),
            webhook_url,
            support_url: config.support_url.clone(),
            repository_url: config.repository_url.clone(),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Support link appended to user-facing failure notices, if configured.
    pub fn support_url(&self) -> Option<&str> {
        self.support_url.as_deref()
    }

    /// Persist and forward one failure.
    pub async fn report(&self, context: &FailureContext, error: &(dyn StdError + Send + Sync + 'static)) {
        tracing::error!(command = %context.command, error = %error, "Unexpected failure");
        let text = render(context, error);

        if let Some(parent) = self.log_path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(error = %err, "Could not create error log directory");
            }
        }
        if let Err(err) = tokio::fs::write(&self.log_path, &text).await {
            tracing::warn!(path = %self.log_path.display(), error = %err, "Could not write error log");
        }

        if let Some(url) = &self.webhook_url {
            self.forward(url, context, &text).await;
        }
    }

    async fn forward(&self, url: &SecretString, context: &FailureContext, text: &str) {
        let mut fields = Vec::new();
        if let Some(support) = &self.support_url {
            fields.push(json!({"name": "Support", "value": support}));
        }
        if let Some(repo) = &self.repository_url {
            fields.push(json!({"name": "Source", "value": repo}));
        }
        let body = json!({
            "username": "agora errors",
            "embeds": [{
                "title": format!("Unexpected error in `{}`", context.command),
                "description": format!("```\n{}\n```", truncate(text, 3900)),
                "fields": fields,
            }]
        });

        match self.client.post(url.expose_secret()).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Error report forwarded");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "Error webhook rejected the report");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not forward error report");
            }
        }
    }
}

/// Header with the command and its options, then the error chain.
fn render(context: &FailureContext, error: &(dyn StdError + 'static)) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Time: {}", Utc::now().to_rfc3339());
    let _ = writeln!(out, "Command: {}", context.command);
    if let Some(user) = &context.user {
        let _ = writeln!(out, "User: {user}");
    }
    if !context.options.is_empty() {
        let options: Vec<String> = context
            .options
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let _ = writeln!(out, "Options: {}", options.join(", "));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "Caused by: {cause}");
        source = cause.source();
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
