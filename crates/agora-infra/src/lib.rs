//! Infrastructure layer for Agora.
//!
//! Contains implementations of the port traits defined in `agora-core`:
//! the Ollama chat client, the Discord REST client, the JSON-file
//! configuration repository, plus runtime config loading and the
//! unexpected-failure reporter.

pub mod config;
pub mod discord;
pub mod ollama;
pub mod report;
pub mod storage;
