//! Sessions with an SMTP server.
//!
//! [`Client`] tracks the protocol state in its type parameter so that, for
//! example, `DATA` can only be issued after at least one accepted recipient.

mod client;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, SmtpConnection,
};
pub use stream::{SmtpStream, connect, connect_tls};

use crate::types::{AuthMechanism, Extension};

/// What the server told us about itself during the greeting exchange.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// Host name from the 220 banner.
    pub banner_host: String,
    /// Whether the server answered EHLO (as opposed to HELO).
    pub esmtp: bool,
    /// Extensions listed in the EHLO reply.
    pub extensions: Vec<Extension>,
}

impl Capabilities {
    pub(crate) fn from_banner(reply_lines: &[String]) -> Self {
        let banner_host = reply_lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        Self {
            banner_host,
            ..Self::default()
        }
    }

    /// Replaces the extension list with the lines of an EHLO reply.
    ///
    /// The first line is the server's greeting and is skipped.
    pub(crate) fn record_ehlo(&mut self, reply_lines: &[String]) {
        self.esmtp = true;
        self.extensions = reply_lines.iter().skip(1).map(|l| Extension::parse(l)).collect();
    }

    pub(crate) fn record_helo(&mut self) {
        self.esmtp = false;
        self.extensions.clear();
    }

    /// Whether STARTTLS was advertised.
    #[must_use]
    pub fn starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// Advertised SASL mechanisms, empty when AUTH was not offered.
    #[must_use]
    pub fn auth_mechanisms(&self) -> &[AuthMechanism] {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechs) => Some(mechs.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Advertised message size limit in bytes, if any.
    #[must_use]
    pub fn max_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(limit) => *limit,
            _ => None,
        })
    }
}
