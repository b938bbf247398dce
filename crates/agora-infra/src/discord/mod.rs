//! Discord REST adapter for the [`MessagingPlatform`] port.
//!
//! Only the REST calls the conversation engine needs: channel lookup,
//! webhook management and execution, message fetch. Gateway handling is
//! left to an external relay that forwards message events over HTTP.
//!
//! [`MessagingPlatform`]: agora_core::platform::MessagingPlatform

pub mod client;
pub mod types;

pub use client::DiscordClient;
