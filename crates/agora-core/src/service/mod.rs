//! Business logic services (use cases).
//!
//! Services orchestrate repository calls, the conversation engine and
//! business rules. They depend on traits (ports) -- never on concrete
//! infrastructure implementations.

pub mod conversation;
pub mod persona;
pub mod progress;
pub mod settings;

pub use conversation::{ConversationService, ReplyOutcome};
pub use persona::{DefaultsLoaded, PersonaService};
pub use progress::{NoProgress, ProgressReporter};
pub use settings::SettingsService;
