//! Named factories for content generators.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::contract::{BoxError, ContentGenerator};
use crate::request::GeneratorConfig;

/// Builds a generator from its configuration.
pub type GeneratorFactory =
    Arc<dyn Fn(GeneratorConfig) -> Result<Box<dyn ContentGenerator>, BoxError> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("generator '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("generator '{0}' is not registered")]
    NotRegistered(String),
    #[error("generator '{name}' could not be created: {source}")]
    Factory {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Generator name to factory, safe to share between concurrent runs.
///
/// Registration takes the write lock; `create` only holds the read lock long
/// enough to clone the factory out, then calls it unlocked.
#[derive(Default)]
pub struct GeneratorRegistry {
    factories: RwLock<HashMap<String, GeneratorFactory>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory` under `name`. An existing entry is never replaced.
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(GeneratorConfig) -> Result<Box<dyn ContentGenerator>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        info!(generator = %name, "[REGISTRY] Registered generator");
        factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Like [`register`](Self::register), for start-up code where a clash is a bug.
    ///
    /// # Panics
    /// If `name` is already registered.
    pub fn must_register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(GeneratorConfig) -> Result<Box<dyn ContentGenerator>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        if let Err(e) = self.register(name, factory) {
            panic!("{e}");
        }
    }

    pub fn create(
        &self,
        name: &str,
        config: GeneratorConfig,
    ) -> Result<Box<dyn ContentGenerator>, RegistryError> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))?;

        debug!(generator = %name, "[REGISTRY] Creating generator");
        factory(config).map_err(|source| RegistryError::Factory {
            name: name.to_owned(),
            source,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
