//! Error types for MIME assembly.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or decoding MIME documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Header name or value would break the header block.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Malformed or incomplete `Content-Type`.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// Malformed RFC 2047 encoded-word.
    #[error("invalid encoded word: {0}")]
    InvalidEncodedWord(String),

    /// Base64 payload could not be decoded.
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded text is not UTF-8.
    #[error("utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A message was built without any To recipient.
    #[error("message has no To recipient")]
    NoRecipients,
}
