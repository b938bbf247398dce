//! Chat provider abstractions for Agora.
//!
//! - `ChatProvider`: RPITIT trait for concrete inference backends
//! - `BoxChatProvider`: object-safe wrapper for dynamic dispatch

pub mod box_provider;
pub mod provider;
