//! Persona registry: the templates agents are instantiated from.

pub mod defaults;
pub mod registry;

pub use defaults::default_personas;
pub use registry::PersonaRegistry;
