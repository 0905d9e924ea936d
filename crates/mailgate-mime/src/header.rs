//! MIME header handling.

use crate::error::{Error, Result};
use std::fmt;

/// Ordered collection of email headers.
///
/// Names keep the caller's casing and lookups are case-insensitive.
/// Values are checked on insertion so a caller-supplied value cannot start
/// a new header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is empty or contains
    /// whitespace, a colon or control characters, or if the value contains a
    /// line break that is not followed by folding whitespace.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate_name(&name)?;
        validate_value(&name, &value)?;
        self.headers.push((name, value));
        Ok(())
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if a header with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses a header block, unfolding continuation lines.
    ///
    /// Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a header nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                let (_, value) = headers.headers.last_mut().ok_or_else(|| {
                    Error::InvalidHeader(format!("continuation without header: {line}"))
                })?;
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::InvalidHeader(format!("missing colon: {line}")))?;
            headers.add(name.trim(), value.trim())?;
        }

        Ok(headers)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidHeader("header name is empty".to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_graphic() && c != ':') {
        return Err(Error::InvalidHeader(format!("invalid header name: {name:?}")));
    }
    Ok(())
}

fn validate_value(name: &str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        let folded = match b {
            b'\r' => bytes.get(i + 1) == Some(&b'\n') && matches!(bytes.get(i + 2), Some(b' ' | b'\t')),
            b'\n' => i > 0 && bytes[i - 1] == b'\r' && matches!(bytes.get(i + 1), Some(b' ' | b'\t')),
            _ => true,
        };
        if !folded {
            return Err(Error::InvalidHeader(format!(
                "line break in value of header {name}"
            )));
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain").unwrap();
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_headers_keep_order_and_case() {
        let mut headers = Headers::new();
        headers.add("X-Campaign", "spring").unwrap();
        headers.add("From", "a@example.com").unwrap();
        headers.add("x-trace", "1").unwrap();

        assert_eq!(
            headers.to_string(),
            "X-Campaign: spring\r\nFrom: a@example.com\r\nx-trace: 1\r\n"
        );
    }

    #[test]
    fn test_headers_reject_injection() {
        let mut headers = Headers::new();
        assert!(headers.add("X-Note", "a\r\nBcc: evil@example.com").is_err());
        assert!(headers.add("X-Note", "a\nb").is_err());
        assert!(headers.add("X-Note", "a\rb").is_err());
        assert!(headers.add("X-Note", "trailing\r\n").is_err());
        assert!(headers.is_empty());

        headers.add("Subject", "=?UTF-8?B?AA==?=\r\n =?UTF-8?B?AA==?=").unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_reject_bad_names() {
        let mut headers = Headers::new();
        assert!(headers.add("", "x").is_err());
        assert!(headers.add("X Bad", "x").is_err());
        assert!(headers.add("X:Bad", "x").is_err());
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Body: not a header\r\n"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(headers.get("Content-Type"), Some("text/plain; charset=utf-8"));
        assert!(!headers.contains("Body"));
    }
}
