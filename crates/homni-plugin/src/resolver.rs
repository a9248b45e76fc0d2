//! Module resolution: turning an entry-point locator into a module object.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::error::PluginError;
use crate::module::PluginModule;

/// Loads the module behind an entry point.
#[async_trait]
pub trait ModuleResolver: Send + Sync + std::fmt::Debug {
    /// Resolves `locator` to a module instance.
    async fn load_module(&self, locator: &str) -> Result<Arc<dyn PluginModule>, PluginError>;
}

/// Constructs a fresh module instance.
pub type ModuleFactory = Arc<dyn Fn() -> Arc<dyn PluginModule> + Send + Sync>;

/// Resolver backed by a table of compiled-in module factories.
#[derive(Default)]
pub struct StaticModuleResolver {
    /// Locator → factory.
    factories: RwLock<HashMap<String, ModuleFactory>>,
}

impl std::fmt::Debug for StaticModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticModuleResolver")
            .field("locators", &self.locators())
            .finish()
    }
}

impl StaticModuleResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for a locator, replacing any previous one.
    pub fn register<F>(&self, locator: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn PluginModule> + Send + Sync + 'static,
    {
        let mut factories = match self.factories.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        factories.insert(locator.into(), Arc::new(factory));
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_module<F>(self, locator: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn PluginModule> + Send + Sync + 'static,
    {
        self.register(locator, factory);
        self
    }

    /// Registered locators, sorted.
    pub fn locators(&self) -> Vec<String> {
        let factories = match self.factories.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut locators: Vec<String> = factories.keys().cloned().collect();
        locators.sort();
        locators
    }
}

#[async_trait]
impl ModuleResolver for StaticModuleResolver {
    async fn load_module(&self, locator: &str) -> Result<Arc<dyn PluginModule>, PluginError> {
        let factory = {
            let factories = match self.factories.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            factories.get(locator).cloned()
        };

        let factory = factory.ok_or_else(|| PluginError::ModuleNotFound {
            locator: locator.to_string(),
        })?;

        debug!(locator = %locator, "Module resolved from static table");
        Ok(factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Empty;

    impl PluginModule for Empty {}

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticModuleResolver::new().with_module("builtin://empty", || Arc::new(Empty));

        assert!(resolver.load_module("builtin://empty").await.is_ok());
        assert!(matches!(
            resolver.load_module("./missing").await,
            Err(PluginError::ModuleNotFound { .. })
        ));
        assert_eq!(resolver.locators(), vec!["builtin://empty"]);
    }
}
