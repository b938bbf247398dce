//! Application error type mapping to HTTP status codes and envelope format.
//!
//! User errors carry their failure notice in the envelope. Unexpected
//! failures are reported through the [`ErrorReporter`] by the handler that
//! hit them and surface as a generic 500 with the support link.
//!
//! [`ErrorReporter`]: agora_infra::report::ErrorReporter

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use agora_types::error::{BindingError, ConversationError, PersonaError, SettingsError};
use agora_types::notice::Notice;

use crate::failure::{conversation_notice, persona_notice, settings_notice, unexpected_notice};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Persona(PersonaError),
    Settings(SettingsError),
    Conversation(ConversationError),
    Binding(BindingError),
    /// Authentication failure.
    Unauthorized(String),
    /// Malformed request.
    Validation(String),
    /// Failure already reported; carries the support link.
    Unexpected { support_url: Option<String> },
}

impl From<PersonaError> for AppError {
    fn from(e: PersonaError) -> Self {
        AppError::Persona(e)
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        AppError::Settings(e)
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl From<BindingError> for AppError {
    fn from(e: BindingError) -> Self {
        AppError::Binding(e)
    }
}

impl AppError {
    /// Report the error if it is unexpected, then return it for rendering.
    pub async fn reported(self, state: &AppState, command: &str) -> Self {
        if self.user_notice().is_some() {
            return self;
        }
        let context = agora_infra::report::FailureContext::new(command);
        match &self {
            AppError::Persona(e) => state.reporter.report(&context, e).await,
            AppError::Settings(e) => state.reporter.report(&context, e).await,
            AppError::Conversation(e) => state.reporter.report(&context, e).await,
            AppError::Binding(e) => state.reporter.report(&context, e).await,
            AppError::Unauthorized(_) | AppError::Validation(_) | AppError::Unexpected { .. } => {
                return self;
            }
        }
        AppError::Unexpected {
            support_url: state.reporter.support_url().map(str::to_string),
        }
    }

    fn user_notice(&self) -> Option<Notice> {
        match self {
            AppError::Persona(e) => persona_notice(e),
            AppError::Settings(e) => settings_notice(e),
            AppError::Conversation(e) => conversation_notice(e),
            AppError::Binding(_) => None,
            AppError::Unauthorized(msg) => Some(Notice::failure("Unauthorized", msg.clone())),
            AppError::Validation(msg) => Some(Notice::failure("Invalid Request", msg.clone())),
            AppError::Unexpected { .. } => None,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Persona(e) | AppError::Conversation(ConversationError::Persona(e)) => {
                persona_status(e)
            }
            AppError::Conversation(ConversationError::NoAgents) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_AGENTS")
            }
            AppError::Settings(SettingsError::UnknownModel { .. }) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_MODEL")
            }
            AppError::Settings(SettingsError::InvalidParameter(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

fn persona_status(err: &PersonaError) -> (StatusCode, &'static str) {
    match err {
        PersonaError::NotFound(_) => (StatusCode::NOT_FOUND, "PERSONA_NOT_FOUND"),
        PersonaError::DuplicateName(_) => (StatusCode::CONFLICT, "PERSONA_EXISTS"),
        PersonaError::InvalidName(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        PersonaError::NoActiveTemplates | PersonaError::InsufficientActiveTemplates { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_AGENTS")
        }
        PersonaError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let notice = match (&self, self.user_notice()) {
            (_, Some(notice)) => notice,
            (AppError::Unexpected { support_url }, None) => unexpected_notice(support_url.as_deref()),
            (_, None) => unexpected_notice(None),
        };

        (status, Json(ApiResponse::failure(code, notice))).into_response()
    }
}
