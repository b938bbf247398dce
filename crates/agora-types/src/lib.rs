//! Shared domain types for Agora.
//!
//! This crate contains the core domain types used across the Agora workspace:
//! persona templates, agent identities, chat platform handles, generation
//! settings, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod channel;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod notice;
pub mod persona;
