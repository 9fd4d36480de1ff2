//! Content generators and the registry that selects them by name.

pub mod article;
pub mod registry;

pub use registry::{GeneratorFactory, GeneratorRegistry, RegistryError};

/// Registers every generator that ships with this crate.
pub fn register_builtin(registry: &GeneratorRegistry) {
    registry.must_register(article::NAME, article::factory);
}
