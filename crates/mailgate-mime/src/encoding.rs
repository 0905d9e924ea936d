//! MIME encoding utilities.
//!
//! Supports Base64 bodies, RFC 2047 header encoding and RFC 2231
//! parameter values.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum line length for encoded bodies (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Maximum length of a single RFC 2047 encoded word.
const MAX_ENCODED_WORD: usize = 75;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-separated lines of at most 76 characters.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);
    // Base64 output is ASCII, so byte chunks are valid UTF-8.
    for (i, line) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            wrapped.push_str("\r\n");
        }
        wrapped.push_str(&String::from_utf8_lossy(line));
    }
    wrapped
}

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Returns true if `text` cannot appear verbatim in a header.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.contains("=?") || text.chars().any(|c| c != '\t' && !(' '..='~').contains(&c))
}

/// Encodes a header value using RFC 2047 B encoding when needed.
///
/// Format: `=?charset?B?encoded-text?=`. Long values are split into several
/// encoded words joined by a folding CRLF + space, each word at most 75
/// characters and never splitting a character.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let overhead = "=?".len() + charset.len() + "?B?".len() + "?=".len();
    let max_b64 = MAX_ENCODED_WORD.saturating_sub(overhead).max(4);
    let max_bytes = (max_b64 / 4 * 3).max(4);

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if !chunk.is_empty() && chunk.len() + ch.len_utf8() > max_bytes {
            words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join("\r\n ")
}

/// Decodes a header value containing RFC 2047 B-encoded words.
///
/// Whitespace between adjacent encoded words is dropped; other text is kept.
///
/// # Errors
///
/// Returns an error if an encoded word is malformed or uses an unsupported encoding.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut out = String::new();
    let mut previous_encoded = false;

    for (i, token) in text.split_whitespace().enumerate() {
        let is_encoded = token.starts_with("=?") && token.ends_with("?=") && token.len() > 4;
        if i > 0 && !(is_encoded && previous_encoded) {
            out.push(' ');
        }

        if is_encoded {
            let inner = &token[2..token.len() - 2];
            let parts: Vec<&str> = inner.split('?').collect();
            if parts.len() != 3 {
                return Err(Error::InvalidEncodedWord(token.to_string()));
            }
            if !parts[1].eq_ignore_ascii_case("B") {
                return Err(Error::InvalidEncodedWord(format!(
                    "unsupported encoding {}",
                    parts[1]
                )));
            }
            out.push_str(&String::from_utf8(decode_base64(parts[2])?)?);
        } else {
            out.push_str(token);
        }
        previous_encoded = is_encoded;
    }

    Ok(out)
}

/// Encodes a parameter value as an RFC 2231 extended value.
///
/// Produces `UTF-8''` followed by the percent-encoded UTF-8 bytes; the
/// parameter name must carry a trailing `*` (`filename*=...`).
#[must_use]
pub fn encode_rfc2231(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3 + 7);
    out.push_str("UTF-8''");
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
