//! Splits command failures into user errors and unexpected failures.
//!
//! User errors (duplicate names, missing personas, bad parameters) become a
//! failure notice naming the problem. Anything else is unexpected: it is
//! reported through the [`ErrorReporter`] and the user sees a generic
//! notice with the support link.
//!
//! [`ErrorReporter`]: agora_infra::report::ErrorReporter

use agora_types::error::{ConversationError, PersonaError, SettingsError};
use agora_types::notice::Notice;

/// The notice for a user error, or `None` if `err` is unexpected.
pub fn user_notice(err: &anyhow::Error) -> Option<Notice> {
    if let Some(err) = err.downcast_ref::<PersonaError>() {
        return persona_notice(err);
    }
    if let Some(err) = err.downcast_ref::<SettingsError>() {
        return settings_notice(err);
    }
    if let Some(err) = err.downcast_ref::<ConversationError>() {
        return conversation_notice(err);
    }
    None
}

pub fn persona_notice(err: &PersonaError) -> Option<Notice> {
    let title = match err {
        PersonaError::DuplicateName(_) => "Agent Already Exists",
        PersonaError::NotFound(_) => "Agent Not Found",
        PersonaError::NoActiveTemplates | PersonaError::InsufficientActiveTemplates { .. } => {
            "Not Enough Active Agents"
        }
        PersonaError::InvalidName(_) => "Invalid Agent Name",
        PersonaError::Storage(_) => return None,
    };
    Some(Notice::failure(title, capitalize(&err.to_string())))
}

pub fn settings_notice(err: &SettingsError) -> Option<Notice> {
    let title = match err {
        SettingsError::UnknownModel { .. } => "Model Not Available",
        SettingsError::InvalidParameter(_) => "Invalid Parameter",
        SettingsError::Storage(_) => return None,
    };
    Some(Notice::failure(title, capitalize(&err.to_string())))
}

pub fn conversation_notice(err: &ConversationError) -> Option<Notice> {
    match err {
        ConversationError::NoAgents => Some(Notice::failure(
            "No Agents",
            "No agents available for conversation",
        )),
        ConversationError::Persona(inner) => persona_notice(inner),
        _ => None,
    }
}

/// Shown for every unexpected failure.
pub fn unexpected_notice(support_url: Option<&str>) -> Notice {
    let notice = Notice::failure(
        "Error",
        "An unexpected error occurred. It has been logged for the operators.",
    );
    match support_url {
        Some(url) => notice.with_field("Support", url),
        None => notice,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::error::PlatformError;
    use agora_types::llm::LlmError;

    #[test]
    fn test_persona_errors_are_user_facing() {
        let err = anyhow::Error::new(PersonaError::DuplicateName("tech".into()));
        let notice = user_notice(&err).unwrap();
        assert_eq!(notice.title, "Agent Already Exists");
        assert_eq!(notice.description, "An agent template named 'tech' already exists");
    }

    #[test]
    fn test_insufficient_templates_through_conversation_error() {
        let err = anyhow::Error::new(ConversationError::Persona(
            PersonaError::InsufficientActiveTemplates { requested: 5, active: 2 },
        ));
        assert_eq!(user_notice(&err).unwrap().title, "Not Enough Active Agents");
    }

    #[test]
    fn test_adapter_failures_are_unexpected() {
        let err = anyhow::Error::new(ConversationError::Generation {
            agent: "Agent_tech".into(),
            source: LlmError::Unreachable("refused".into()),
        });
        assert!(user_notice(&err).is_none());

        let err = anyhow::Error::new(ConversationError::Platform(PlatformError::MissingToken));
        assert!(user_notice(&err).is_none());

        let err = anyhow::Error::new(PersonaError::Storage("disk full".into()));
        assert!(user_notice(&err).is_none());
    }

    #[test]
    fn test_unexpected_notice_carries_support_link() {
        let notice = unexpected_notice(Some("https://example.org/support"));
        assert_eq!(notice.fields[0].value, "https://example.org/support");
        assert!(unexpected_notice(None).fields.is_empty());
    }
}
