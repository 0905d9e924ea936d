//! Mail configuration model.
//!
//! Loading is left to the caller: [`MailConfig`] is plain serde data, so any
//! source that can deserialize into it works.

mod duration;

pub use duration::parse_duration;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Driver used when the configuration does not name one.
pub const FALLBACK_DRIVER: &str = "mandrill";

/// Top-level mail configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Name of the driver used when a send does not pick one.
    #[serde(rename = "default", alias = "default_driver")]
    pub default_driver: String,
    /// Sender address applied when a message has none.
    pub default_from: String,
    /// Sender display name applied when a message has none.
    pub default_from_name: String,
    /// Per-driver settings keyed by driver name.
    pub drivers: HashMap<String, DriverConfig>,
}

impl MailConfig {
    /// Creates a configuration with the given default driver.
    #[must_use]
    pub fn new(default_driver: impl Into<String>) -> Self {
        Self {
            default_driver: default_driver.into(),
            ..Self::default()
        }
    }

    /// Sets the default sender.
    #[must_use]
    pub fn default_from(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.default_from = address.into();
        self.default_from_name = name.into();
        self
    }

    /// Adds a driver configuration.
    #[must_use]
    pub fn driver(mut self, name: impl Into<String>, config: DriverConfig) -> Self {
        self.drivers.insert(name.into(), config);
        self
    }

    /// Fills in defaults for unset fields.
    pub fn apply_defaults(&mut self) {
        if self.default_driver.is_empty() {
            self.default_driver = FALLBACK_DRIVER.to_string();
        }
    }

    /// Checks the default driver is set and configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.default_driver.is_empty() {
            return Err(Error::DriverConfig("default driver is required".into()));
        }
        if self.drivers.is_empty() {
            return Err(Error::DriverConfig(
                "at least one driver must be configured".into(),
            ));
        }
        if !self.drivers.contains_key(&self.default_driver) {
            return Err(Error::DriverConfig(format!(
                "default driver '{}' is not configured",
                self.default_driver
            )));
        }
        Ok(())
    }
}

/// Untyped settings for one driver.
///
/// Each driver reads only the keys it understands and applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverConfig(Map<String, Value>);

impl DriverConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `key` if it holds a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `key` as an integer, accepting both integer and float values.
    ///
    /// Floats are truncated toward zero.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let value = self.0.get(key)?;
        value.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            value.as_f64().map(|f| f as i64)
        })
    }

    /// Returns `key` parsed as a duration string.
    ///
    /// Unparseable values are logged and treated as absent.
    #[must_use]
    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        let raw = self.get_str(key)?;
        let parsed = parse_duration(raw);
        if parsed.is_none() {
            tracing::warn!(key, value = raw, "ignoring invalid duration");
        }
        parsed
    }

    /// Returns true if no settings are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for DriverConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DriverConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_apply_defaults() {
        let mut config = MailConfig::default();
        config.apply_defaults();
        assert_eq!(config.default_driver, FALLBACK_DRIVER);

        let mut config = MailConfig::new("smtp");
        config.apply_defaults();
        assert_eq!(config.default_driver, "smtp");
    }

    #[test]
    fn test_validate_ok() {
        let config = MailConfig::new("smtp").driver("smtp", DriverConfig::new().set("host", "localhost"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_default() {
        let config = MailConfig::default().driver("smtp", DriverConfig::new());
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::DriverConfig);
    }

    #[test]
    fn test_validate_no_drivers() {
        let config = MailConfig::new("smtp");
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::DriverConfig);
    }

    #[test]
    fn test_validate_default_not_configured() {
        let config = MailConfig::new("mandrill").driver("smtp", DriverConfig::new());
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverConfig);
        assert!(err.to_string().contains("mandrill"));
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{
            "default": "smtp",
            "default_from": "noreply@example.com",
            "default_from_name": "Example",
            "drivers": {
                "smtp": { "host": "smtp.example.com", "port": 587.0, "timeout": "10s" },
                "mandrill": { "api_key": "key" }
            }
        }"#;
        let config: MailConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_driver, "smtp");
        assert_eq!(config.default_from, "noreply@example.com");
        assert_eq!(config.drivers.len(), 2);

        let smtp = &config.drivers["smtp"];
        assert_eq!(smtp.get_str("host"), Some("smtp.example.com"));
        assert_eq!(smtp.get_i64("port"), Some(587));
        assert_eq!(smtp.get_duration("timeout"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_deserialize_alias() {
        let config: MailConfig = serde_json::from_str(r#"{"default_driver":"smtp"}"#).unwrap();
        assert_eq!(config.default_driver, "smtp");
        assert!(config.drivers.is_empty());
    }

    #[test]
    fn test_driver_config_accessors() {
        let config: DriverConfig = [("port", Value::from(25)), ("name", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(config.get_i64("port"), Some(25));
        assert_eq!(config.get_str("port"), None);
        assert_eq!(config.get_i64("name"), None);
        assert_eq!(config.get_duration("missing"), None);
    }

    #[test]
    fn test_invalid_duration_is_absent() {
        let config = DriverConfig::new().set("timeout", "soon");
        assert_eq!(config.get_duration("timeout"), None);
    }
}
