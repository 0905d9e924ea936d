//! SMTP driver configuration.

use mailgate_core::{DriverConfig, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default SMTP port.
pub const DEFAULT_PORT: u16 = 25;

/// Default dial timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection security mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Security {
    /// Plain TCP.
    #[default]
    None,
    /// Implicit TLS from the first byte.
    Tls,
    /// Plain TCP upgraded with STARTTLS when the server offers it.
    StartTls,
}

impl FromStr for Security {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "tls" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            other => Err(Error::DriverConfig(format!(
                "unknown SMTP security mode '{other}' (expected none, tls or starttls)"
            ))),
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::StartTls => "starttls",
        })
    }
}

/// Settings for one SMTP driver instance.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    /// Server host name, also used as the TLS server name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login name; authentication needs both username and password.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Connection security.
    pub security: Security,
    /// Dial timeout.
    pub timeout: Duration,
    /// Host name announced in EHLO/HELO.
    pub local_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            security: Security::None,
            timeout: DEFAULT_TIMEOUT,
            local_name: String::new(),
        }
    }
}

impl SmtpConfig {
    /// Creates a configuration for `host` with defaults for everything else.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Reads the recognized keys from an untyped driver configuration.
    ///
    /// Keys: `host`, `port` (integer or float), `username`, `password`,
    /// `security`, `timeout` (duration string) and `local_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`] for an unknown `security` mode or a
    /// port outside the TCP range. An unparseable `timeout` is ignored.
    pub fn from_driver_config(raw: &DriverConfig) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = raw.get_str("host") {
            host.clone_into(&mut config.host);
        }
        if let Some(port) = raw.get_i64("port") {
            config.port = u16::try_from(port)
                .map_err(|_| Error::DriverConfig(format!("SMTP port {port} is out of range")))?;
        } else if raw.get("port").is_some() {
            warn!("ignoring non-numeric SMTP port");
        }
        if let Some(username) = raw.get_str("username") {
            username.clone_into(&mut config.username);
        }
        if let Some(password) = raw.get_str("password") {
            password.clone_into(&mut config.password);
        }
        if let Some(security) = raw.get_str("security") {
            config.security = security.parse()?;
        }
        if let Some(timeout) = raw.get_duration("timeout") {
            config.timeout = timeout;
        }
        if let Some(local_name) = raw.get_str("local_name") {
            local_name.clone_into(&mut config.local_name);
        }

        Ok(config)
    }

    /// Checks the settings needed to reach a server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`] if the host is empty or the port is zero.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::DriverConfig("SMTP host is required".to_string()));
        }
        if self.port == 0 {
            return Err(Error::DriverConfig("SMTP port is invalid".to_string()));
        }
        Ok(())
    }

    /// Returns the credentials when both username and password are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        (!self.username.is_empty() && !self.password.is_empty())
            .then_some((self.username.as_str(), self.password.as_str()))
    }

    /// Returns the EHLO host name.
    #[must_use]
    pub fn hello_name(&self) -> &str {
        if self.local_name.is_empty() {
            "localhost"
        } else {
            &self.local_name
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("security", &self.security)
            .field("timeout", &self.timeout)
            .field("local_name", &self.local_name)
            .finish()
    }
}
