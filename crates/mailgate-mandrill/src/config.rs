//! Mandrill driver configuration.

use crate::error::Error;
use mailgate_core::{DriverConfig, Error as MailError, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://mandrillapp.com/api/1.0";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one Mandrill driver instance.
#[derive(Clone, PartialEq, Eq)]
pub struct MandrillConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for MandrillConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl MandrillConfig {
    /// Creates a configuration for `api_key` with the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reads `api_key`, `base_url` and `timeout` from a driver configuration.
    ///
    /// An empty `base_url` keeps the default and an unparseable `timeout` is
    /// ignored.
    #[must_use]
    pub fn from_driver_config(raw: &DriverConfig) -> Self {
        let mut config = Self::default();
        if let Some(api_key) = raw.get_str("api_key") {
            api_key.clone_into(&mut config.api_key);
        }
        if let Some(base_url) = raw.get_str("base_url").filter(|u| !u.is_empty()) {
            base_url.clone_into(&mut config.base_url);
        }
        if let Some(timeout) = raw.get_duration("timeout") {
            config.timeout = timeout;
        }
        config
    }

    /// Checks the API key is set and the base URL is usable.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::DriverConfig`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(MailError::DriverConfig("Mandrill API key is required".to_string()));
        }
        self.endpoint("/messages/send.json")?;
        Ok(())
    }

    /// Joins `path` onto the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::DriverConfig`] if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let url = Url::parse(&joined).map_err(Error::from)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MailError::DriverConfig(format!(
                "Mandrill base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

impl fmt::Debug for MandrillConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MandrillConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
