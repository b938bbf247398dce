//! Business logic and port trait definitions for Agora.
//!
//! This crate owns the multi-agent conversation engine (agents, rolling
//! history, turn scheduling, identity binding, chunking) and defines the
//! "ports" that the infrastructure layer implements: the chat provider,
//! the messaging platform, the configuration repository and the clock.
//! It depends only on `agora-types` -- never on `agora-infra` or any
//! HTTP/IO crate.

pub mod agent;
pub mod clock;
pub mod conversation;
pub mod llm;
pub mod persona;
pub mod platform;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
