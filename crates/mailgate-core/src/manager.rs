//! Driver lifecycle manager.

use crate::builder::Builder;
use crate::config::MailConfig;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::registry::{Registry, default_registry};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Resolves configured driver names into live, cached driver instances.
///
/// At most one instance is constructed per name for the manager's lifetime
/// (until [`Manager::close`]), even when several tasks ask for the same
/// driver at once.
pub struct Manager {
    config: MailConfig,
    registry: Arc<Registry>,
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl Manager {
    /// Creates a manager over `registry`.
    ///
    /// Defaults are applied first. When no drivers are configured the
    /// configuration is not validated, which leaves the manager usable by
    /// tooling that has nothing to send yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`] if drivers are configured but the
    /// default driver is missing from them.
    pub fn new(mut config: MailConfig, registry: Arc<Registry>) -> Result<Self> {
        config.apply_defaults();
        if !config.drivers.is_empty() {
            config.validate()?;
        }

        Ok(Self {
            config,
            registry,
            drivers: RwLock::new(HashMap::new()),
        })
    }

    /// Creates a manager over the process-wide [`default_registry`].
    ///
    /// # Errors
    ///
    /// See [`Manager::new`].
    pub fn with_default_registry(config: MailConfig) -> Result<Self> {
        Self::new(config, default_registry())
    }

    /// Returns the driver named `name`, constructing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverNotFound`] if `name` has no configuration or no
    /// registered factory, or the factory's configuration error.
    pub fn get_driver(&self, name: &str) -> Result<Arc<dyn Driver>> {
        if let Some(driver) = self.drivers.read().get(name) {
            return Ok(Arc::clone(driver));
        }

        let mut drivers = self.drivers.write();
        // Another caller may have built it while we waited for the write lock.
        if let Some(driver) = drivers.get(name) {
            return Ok(Arc::clone(driver));
        }

        let driver_config = self
            .config
            .drivers
            .get(name)
            .ok_or_else(|| Error::DriverNotFound(format!("driver '{name}' is not configured")))?;

        let driver = self.registry.create(name, driver_config)?;
        drivers.insert(name.to_string(), Arc::clone(&driver));

        info!(driver = name, "email driver created");
        Ok(driver)
    }

    /// Returns the configured default driver.
    ///
    /// # Errors
    ///
    /// See [`Manager::get_driver`].
    pub fn default_driver(&self) -> Result<Arc<dyn Driver>> {
        self.get_driver(&self.config.default_driver)
    }

    /// Starts composing a message for the default driver.
    #[must_use]
    pub fn builder(&self) -> Builder<'_> {
        Builder::new(self, self.config.default_driver.clone())
    }

    /// Drops every cached driver. Later lookups construct fresh instances.
    pub fn close(&self) {
        self.drivers.write().clear();
    }

    /// Alias of [`Manager::close`] for shutdown hooks.
    pub fn shutdown(&self) {
        self.close();
    }

    /// Returns the effective configuration (defaults applied).
    #[must_use]
    pub const fn config(&self) -> &MailConfig {
        &self.config
    }

    /// Returns the driver names known to the registry.
    #[must_use]
    pub fn available_drivers(&self) -> HashSet<String> {
        self.registry.names()
    }

    /// Returns the number of constructed drivers currently cached.
    #[must_use]
    pub fn cached_drivers(&self) -> usize {
        self.drivers.read().len()
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("default_driver", &self.config.default_driver)
            .field("registry", &self.registry)
            .field("cached", &self.drivers.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
