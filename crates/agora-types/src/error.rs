use thiserror::Error;

use crate::llm::LlmError;

/// Errors related to persona registry operations.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("an agent template named '{0}' already exists")]
    DuplicateName(String),

    #[error("agent template '{0}' not found")]
    NotFound(String),

    #[error("no active agent templates found")]
    NoActiveTemplates,

    #[error("requested {requested} agents but only {active} active templates are available")]
    InsufficientActiveTemplates { requested: usize, active: usize },

    #[error("invalid agent name: {0}")]
    InvalidName(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors raised while running a conversation.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("no agents available for conversation")]
    NoAgents,

    #[error("generation failed for {agent}: {source}")]
    Generation {
        agent: String,
        #[source]
        source: LlmError,
    },

    #[error("delivery failed for {agent}: {source}")]
    Delivery {
        agent: String,
        #[source]
        source: PlatformError,
    },

    #[error(transparent)]
    Persona(#[from] PersonaError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors from per-user generation settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("model '{model}' is not available (available: {})", .available.join(", "))]
    UnknownModel { model: String, available: Vec<String> },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from the messaging platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("bot token is not configured")]
    MissingToken,

    #[error("channel {0} does not belong to a guild")]
    NotInGuild(String),
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::Http { status: 404, .. })
    }
}

/// Errors from binding agents to channel identities.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("could not resolve channel {channel}: {source}")]
    Resolve {
        channel: String,
        #[source]
        source: PlatformError,
    },

    #[error("could not bind identity '{name}': {source}")]
    Bind {
        name: String,
        #[source]
        source: PlatformError,
    },

    #[error("identity '{0}' has no execution token")]
    MissingToken(String),
}

impl From<BindingError> for PlatformError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::Resolve { source, .. } | BindingError::Bind { source, .. } => source,
            BindingError::MissingToken(name) => PlatformError::Request(format!(
                "identity '{name}' has no execution token"
            )),
        }
    }
}

/// Errors from repository operations (used by trait definitions in agora-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for PersonaError {
    fn from(err: RepositoryError) -> Self {
        PersonaError::Storage(err.to_string())
    }
}

impl From<RepositoryError> for SettingsError {
    fn from(err: RepositoryError) -> Self {
        SettingsError::Storage(err.to_string())
    }
}

impl From<RepositoryError> for ConversationError {
    fn from(err: RepositoryError) -> Self {
        ConversationError::Persona(err.into())
    }
}
