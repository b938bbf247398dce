//! Persistent storage for per-user configuration.
//!
//! Implements the `ConfigRepository` trait from `agora-core` against a
//! single JSON document on the local filesystem.

pub mod json_config;

pub use json_config::JsonConfigRepository;
