//! Driver name to factory catalogue.

use crate::config::DriverConfig;
use crate::driver::{Driver, DriverFactory};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

/// Maps driver names to factories. Holds no driver instances.
#[derive(Default)]
pub struct Registry {
    factories: RwLock<HashMap<String, DriverFactory>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous factory.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&DriverConfig) -> Result<Arc<dyn Driver>> + Send + Sync + 'static,
    {
        self.factories.write().insert(name.into(), Arc::new(factory));
    }

    /// Builds a driver with the factory registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverNotFound`] if no factory is registered, or the
    /// factory's own error.
    pub fn create(&self, name: &str, config: &DriverConfig) -> Result<Arc<dyn Driver>> {
        // Release the lock before running the factory so factories may use the registry.
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::DriverNotFound(format!("no factory registered for '{name}'")))?;
        factory(config)
    }

    /// Returns true if a factory is registered under `name`.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Returns the registered driver names.
    #[must_use]
    pub fn names(&self) -> HashSet<String> {
        self.factories.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("drivers", &self.names())
            .finish()
    }
}

/// Returns the process-wide shared registry, creating it on first use.
///
/// It starts empty; transports are added by an explicit bootstrap step.
#[must_use]
pub fn default_registry() -> Arc<Registry> {
    static DEFAULT: OnceLock<Arc<Registry>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(Registry::new())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::MockDriver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_create_unknown() {
        let registry = Registry::new();
        let err = registry.create("nope", &DriverConfig::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverNotFound);
    }

    #[test]
    fn test_create_calls_factory_once_per_call() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.register("mock", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockDriver::new("mock")) as Arc<dyn Driver>)
        });

        let driver = registry.create("mock", &DriverConfig::new()).unwrap();
        assert_eq!(driver.name(), "mock");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        registry.create("mock", &DriverConfig::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = Registry::new();
        registry.register("broken", |_| Err(Error::DriverConfig("missing api_key".into())));
        let err = registry.create("broken", &DriverConfig::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverConfig);
    }

    #[test]
    fn test_factory_receives_config() {
        let registry = Registry::new();
        registry.register("mock", |config| {
            let name = config.get_str("name").unwrap_or("unnamed").to_string();
            Ok(Arc::new(MockDriver::new(name)) as Arc<dyn Driver>)
        });
        let driver = registry
            .create("mock", &DriverConfig::new().set("name", "custom"))
            .unwrap();
        assert_eq!(driver.name(), "custom");
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = Registry::new();
        registry.register("mock", |_| Ok(Arc::new(MockDriver::new("first")) as Arc<dyn Driver>));
        registry.register("mock", |_| Ok(Arc::new(MockDriver::new("second")) as Arc<dyn Driver>));
        let driver = registry.create("mock", &DriverConfig::new()).unwrap();
        assert_eq!(driver.name(), "second");
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_has_and_names() {
        let registry = Registry::new();
        assert!(!registry.has("a"));
        registry.register("a", |_| Ok(Arc::new(MockDriver::new("a")) as Arc<dyn Driver>));
        registry.register("b", |_| Ok(Arc::new(MockDriver::new("b")) as Arc<dyn Driver>));
        assert!(registry.has("a"));
        let names = registry.names();
        assert!(names.contains("a") && names.contains("b"));
    }

    #[test]
    fn test_default_registry_is_shared() {
        let a = default_registry();
        let b = default_registry();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
