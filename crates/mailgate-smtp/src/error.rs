//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server answered a command with a non-success reply.
    #[error("{command} rejected with {code}: {message}")]
    Rejected {
        /// Command that was rejected (e.g. "RCPT").
        command: &'static str,
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected or malformed response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection closed by the server.
    #[error("Connection closed by server")]
    Closed,

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates a rejection error for `command` from a reply code and message.
    #[must_use]
    pub fn rejected(command: &'static str, code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            command,
            code,
            message: message.into(),
        }
    }

    /// Returns the server reply code, if the server rejected a command.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}
