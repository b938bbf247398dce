//! Live conversation agents.
//!
//! - `RollingHistory`: bounded FIFO list of exchanged turns
//! - `ConversationAgent`: a persona instantiated for one session, with its
//!   system prompt, rolling history and generation profile

pub mod history;
pub mod instance;

pub use history::RollingHistory;
pub use instance::{ConversationAgent, Generation, ModelProfile};
