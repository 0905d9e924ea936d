//! Error types for the Mandrill API client.

use mailgate_core::Error as MailError;

/// Result type alias for Mandrill API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Mandrill API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("failed to parse response (HTTP {status}): {source}")]
    Decode {
        /// HTTP status of the response.
        status: u16,
        /// JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// Error object returned by the API.
    #[error("{name} - {message}")]
    Api {
        /// Error name (e.g. `Invalid_Key`).
        name: String,
        /// Human-readable description.
        message: String,
    },

    /// The API answered with an empty status array.
    #[error("empty response")]
    EmptyResponse,

    /// Invalid base URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Creates an API error from its name and message.
    #[must_use]
    pub fn api(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns true if the request hit the client timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Returns true if the response arrived but its body could not be read.
    #[must_use]
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_body() || e.is_decode())
    }
}

impl From<Error> for MailError {
    fn from(err: Error) -> Self {
        match err {
            Error::Http(_) if err.is_timeout() => {
                Self::timeout("Mandrill request timed out").with_source(err)
            }
            Error::Http(_) if err.is_read_failure() => {
                Self::send_failed("failed to read Mandrill response").with_source(err)
            }
            Error::Http(_) => Self::connection_failed("Mandrill request failed").with_source(err),
            Error::Url(_) => Self::DriverConfig(format!("invalid Mandrill URL: {err}")),
            Error::Api { .. } => Self::send_failed(format!("Mandrill API error: {err}")),
            Error::Decode { .. } => {
                Self::send_failed("failed to parse Mandrill response").with_source(err)
            }
            Error::EmptyResponse => Self::send_failed("Mandrill returned an empty response"),
        }
    }
}
