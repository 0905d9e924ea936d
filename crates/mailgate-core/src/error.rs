//! Error types for mail dispatch.

use crate::message::SendResult;

/// Boxed error used as the underlying cause of transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring drivers or sending mail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No factory or configuration is registered under the requested name.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Driver configuration is missing or invalid.
    #[error("Invalid driver configuration: {0}")]
    DriverConfig(String),

    /// Recipient list is empty or contains an unusable address.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Message content failed validation.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The transport attempted the send but delivery did not succeed.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Human-readable description.
        message: String,
        /// Provider result describing the rejection, if one was returned.
        result: Option<SendResult>,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The transport rejected our credentials.
    #[error("Authentication failed: {message}")]
    AuthFailed {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The transport could not be reached or the session could not be set up.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// The deadline passed or the send was cancelled.
    #[error("Timed out: {message}")]
    Timeout {
        /// Human-readable description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    /// Creates a send failure.
    #[must_use]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
            result: None,
            source: None,
        }
    }

    /// Creates an authentication failure.
    #[must_use]
    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::AuthFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection failure.
    #[must_use]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause to a transport error.
    ///
    /// Has no effect on validation and configuration errors.
    #[must_use]
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            Self::SendFailed { source, .. }
            | Self::AuthFailed { source, .. }
            | Self::ConnectionFailed { source, .. }
            | Self::Timeout { source, .. } => *source = Some(cause.into()),
            _ => {}
        }
        self
    }

    /// Attaches the provider result to a send failure.
    ///
    /// Has no effect on other kinds.
    #[must_use]
    pub fn with_result(mut self, send_result: SendResult) -> Self {
        if let Self::SendFailed { result, .. } = &mut self {
            *result = Some(send_result);
        }
        self
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DriverNotFound(_) => ErrorKind::DriverNotFound,
            Self::DriverConfig(_) => ErrorKind::DriverConfig,
            Self::InvalidRecipient(_) => ErrorKind::InvalidRecipient,
            Self::InvalidMessage(_) => ErrorKind::InvalidMessage,
            Self::SendFailed { .. } => ErrorKind::SendFailed,
            Self::AuthFailed { .. } => ErrorKind::AuthFailed,
            Self::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Returns the provider result that accompanied a send failure.
    #[must_use]
    pub const fn result(&self) -> Option<&SendResult> {
        match self {
            Self::SendFailed { result, .. } => result.as_ref(),
            _ => None,
        }
    }

    /// Returns true if another attempt may succeed without changing the message.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionFailed { .. })
    }
}

/// Error classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::DriverNotFound`].
    DriverNotFound,
    /// See [`Error::DriverConfig`].
    DriverConfig,
    /// See [`Error::SendFailed`].
    SendFailed,
    /// See [`Error::InvalidRecipient`].
    InvalidRecipient,
    /// See [`Error::InvalidMessage`].
    InvalidMessage,
    /// See [`Error::AuthFailed`].
    AuthFailed,
    /// See [`Error::ConnectionFailed`].
    ConnectionFailed,
    /// See [`Error::Timeout`].
    Timeout,
}

impl ErrorKind {
    /// Component prefix shared by every mail error code.
    pub const COMPONENT_CODE: u32 = 31;

    /// Returns the stable numeric code (`component * 10000 + local code`).
    #[must_use]
    pub const fn code(self) -> u32 {
        let local = match self {
            Self::DriverNotFound => 1001,
            Self::DriverConfig => 1002,
            Self::SendFailed => 1003,
            Self::InvalidRecipient => 1004,
            Self::InvalidMessage => 1005,
            Self::AuthFailed => 1006,
            Self::ConnectionFailed => 1007,
            Self::Timeout => 1008,
        };
        Self::COMPONENT_CODE * 10_000 + local
    }

    /// Returns a stable machine-readable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DriverNotFound => "driver_not_found",
            Self::DriverConfig => "driver_config",
            Self::SendFailed => "send_failed",
            Self::InvalidRecipient => "invalid_recipient",
            Self::InvalidMessage => "invalid_message",
            Self::AuthFailed => "auth_failed",
            Self::ConnectionFailed => "connection_failed",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
