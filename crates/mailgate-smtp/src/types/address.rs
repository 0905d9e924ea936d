//! Envelope address type.

use crate::error::{Error, Result};

/// Email address used in `MAIL FROM` and `RCPT TO`.
///
/// Only the shape needed to keep the envelope command well formed is
/// checked: one `@` with non-empty parts and no whitespace, brackets or
/// control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// The null reverse-path (`MAIL FROM:<>`), used when no sender is known.
    #[must_use]
    pub const fn null() -> Self {
        Self(String::new())
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!("{addr:?} contains forbidden characters")));
        }

        match addr.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(())
            }
            _ => Err(Error::InvalidAddress(format!(
                "{addr} must have exactly one @ with non-empty local and domain parts"
            ))),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.to_string(), "user@example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in [
            "",
            "userexample.com",
            "@example.com",
            "user@",
            "a@b@c",
            "user @example.com",
            "user@example.com>\r\nRCPT TO:<x@y",
            "<user@example.com>",
        ] {
            assert!(Address::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_null_address() {
        assert_eq!(Address::null().as_str(), "");
    }
}
