//! Repository trait definitions (ports).
//!
//! The infrastructure layer (agora-infra) implements these against the
//! `config.json` file. The core crate never depends on any storage
//! technology.

pub mod config;
pub mod memory;

pub use config::ConfigRepository;
pub use memory::InMemoryConfigRepository;
