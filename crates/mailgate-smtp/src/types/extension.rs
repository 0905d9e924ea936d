//! SMTP extension types.

/// SMTP extensions discovered from the EHLO response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// AUTH - Authentication
    Auth(Vec<AuthMechanism>),
    /// SIZE - Maximum message size
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// PIPELINING - Command pipelining
    Pipelining,
    /// SMTPUTF8 - UTF-8 email addresses
    SmtpUtf8,
    /// Any other keyword, kept verbatim
    Unknown(String),
}

impl Extension {
    /// Parses an extension line from the EHLO response.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_ascii_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(words.filter_map(AuthMechanism::parse).collect()),
            "SIZE" => Self::Size(words.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "SMTPUTF8" => Self::SmtpUtf8,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN - plaintext authentication
    Plain,
    /// LOGIN - legacy plaintext
    Login,
    /// CRAM-MD5 - challenge-response
    CramMd5,
}

impl AuthMechanism {
    /// Parses an authentication mechanism name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            "CRAM-MD5" => Some(Self::CramMd5),
            _ => None,
        }
    }

    /// Returns the mechanism name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
            Self::CramMd5 => "CRAM-MD5",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords() {
        assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        assert_eq!(Extension::parse("PIPELINING"), Extension::Pipelining);
        assert_eq!(Extension::parse("SMTPUTF8"), Extension::SmtpUtf8);
    }

    #[test]
    fn parse_auth_skips_unknown_mechanisms() {
        assert_eq!(
            Extension::parse("AUTH PLAIN XOAUTH2 login"),
            Extension::Auth(vec![AuthMechanism::Plain, AuthMechanism::Login])
        );
    }

    #[test]
    fn parse_size() {
        assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
    }

    #[test]
    fn parse_unknown_and_empty() {
        assert_eq!(
            Extension::parse("X-CUSTOM foo"),
            Extension::Unknown("X-CUSTOM foo".to_string())
        );
        assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
    }

    #[test]
    fn mechanism_names() {
        assert_eq!(AuthMechanism::parse("cram-md5"), Some(AuthMechanism::CramMd5));
        assert_eq!(AuthMechanism::Plain.as_str(), "PLAIN");
        assert_eq!(AuthMechanism::parse("GSSAPI"), None);
    }
}
