//! The `smtp` mail driver.
//!
//! Each send opens a fresh connection, runs one transaction and closes it:
//!
//! ```text
//! validate → render MIME → dial (plain | TLS) → EHLO/HELO → [STARTTLS] → [AUTH]
//!          → MAIL → RCPT × n → DATA → QUIT
//! ```

mod config;
mod envelope;

pub use config::{DEFAULT_PORT, DEFAULT_TIMEOUT, Security, SmtpConfig};
pub use envelope::{Envelope, render};

use crate::connection::{Client, Connected, SmtpConnection, SmtpStream, connect, connect_tls};
use crate::error::Error as SmtpError;
use crate::types::AuthMechanism;
use chrono::Utc;
use mailgate_core::{
    Driver, DriverConfig, Error, Message, Result, SendContext, SendResult, async_trait,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name the SMTP driver registers under.
pub const DRIVER_NAME: &str = "smtp";

/// Driver that delivers messages over an SMTP session.
///
/// Holds no connection between sends, so one instance can serve concurrent
/// callers.
#[derive(Debug, Clone)]
pub struct SmtpDriver {
    config: SmtpConfig,
}

impl SmtpDriver {
    /// Creates a driver from typed settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`] if the settings are invalid.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let driver = Self { config };
        driver.validate()?;
        Ok(driver)
    }

    /// Creates a driver from an untyped driver configuration.
    ///
    /// # Errors
    ///
    /// See [`SmtpConfig::from_driver_config`] and [`SmtpDriver::new`].
    pub fn from_config(raw: &DriverConfig) -> Result<Self> {
        Self::new(SmtpConfig::from_driver_config(raw)?)
    }

    /// Returns the driver settings.
    #[must_use]
    pub const fn config(&self) -> &SmtpConfig {
        &self.config
    }

    async fn dial(&self) -> Result<SmtpStream> {
        let SmtpConfig {
            host, port, security, timeout, ..
        } = &self.config;
        let addr = format!("{host}:{port}");
        debug!(%addr, %security, "connecting to SMTP server");

        let dial = async {
            match security {
                Security::Tls => connect_tls(host, *port).await,
                Security::None | Security::StartTls => connect(host, *port).await,
            }
        };

        match tokio::time::timeout(*timeout, dial).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(err)) => Err(Error::connection_failed(format!(
                "failed to connect to SMTP server {addr}"
            ))
            .with_source(err)),
            Err(elapsed) => Err(Error::connection_failed(format!(
                "connecting to SMTP server {addr} timed out after {timeout:?}"
            ))
            .with_source(elapsed)),
        }
    }

    async fn open_session(&self) -> Result<Client<Connected>> {
        let stream = self.dial().await?;
        let mut client = Client::from_stream(stream)
            .await
            .map_err(|e| connection_error("SMTP greeting failed", e))?
            .hello(self.config.hello_name())
            .await
            .map_err(|e| connection_error("EHLO failed", e))?;

        if self.config.security == Security::StartTls {
            if client.capabilities().starttls() {
                client = client
                    .starttls(&self.config.host)
                    .await
                    .map_err(|e| connection_error("STARTTLS failed", e))?;
            } else {
                debug!(host = %self.config.host, "server does not offer STARTTLS, continuing in plain text");
            }
        }

        Ok(client)
    }

    async fn deliver(&self, envelope: Envelope, document: &[u8]) -> Result<()> {
        let client = self.open_session().await?;

        let transaction = match self.config.credentials() {
            Some((username, password)) => {
                if !client.is_tls() && !is_local_host(&self.config.host) {
                    return Err(Error::auth_failed(
                        "refusing to send SMTP credentials over an unencrypted connection",
                    ));
                }
                if !client.capabilities().auth_mechanisms().contains(&AuthMechanism::Plain) {
                    debug!(host = %self.config.host, "server does not advertise AUTH PLAIN, trying anyway");
                }
                client
                    .auth_plain(username, password)
                    .await
                    .map_err(|e| Error::auth_failed("SMTP authentication failed").with_source(e))?
                    .mail_from(envelope.from.clone())
                    .await
            }
            None => client.mail_from(envelope.from.clone()).await,
        }
        .map_err(|e| send_error(&format!("MAIL FROM:<{}> failed", envelope.from), e))?;

        let mut recipients = envelope.recipients.into_iter();
        let first = recipients
            .next()
            .ok_or_else(|| Error::InvalidRecipient("recipient list is empty".to_string()))?;
        let first_name = first.to_string();
        let mut transaction = transaction
            .rcpt_to(first)
            .await
            .map_err(|e| send_error(&format!("failed to add recipient {first_name}"), e))?;
        for rcpt in recipients {
            let name = rcpt.to_string();
            transaction = transaction
                .rcpt_to(rcpt)
                .await
                .map_err(|e| send_error(&format!("failed to add recipient {name}"), e))?;
        }

        let client = transaction
            .data()
            .await
            .map_err(|e| send_error("DATA command failed", e))?
            .send_message(document)
            .await
            .map_err(|e| send_error("message data was not accepted", e))?;

        if let Err(err) = client.quit().await {
            warn!(error = %err, "SMTP QUIT failed after message was accepted");
        }
        Ok(())
    }
}

#[async_trait]
impl Driver for SmtpDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    async fn send(&self, ctx: &SendContext, message: &Message) -> Result<SendResult> {
        message.validate()?;

        let envelope = Envelope::from_message(message)?;
        let now = Utc::now();
        let message_id = format!("smtp-{}", now.timestamp_nanos_opt().unwrap_or_default());
        let header_id = format!("{message_id}@{}", self.config.hello_name());
        let document = render(message, &header_id, now.fixed_offset())?;

        ctx.run(self.deliver(envelope, &document)).await?;

        debug!(%message_id, "message accepted by SMTP server");
        Ok(SendResult::new(message_id, "sent", true))
    }
}

/// Builds an [`SmtpDriver`] from a driver configuration, for registries.
///
/// # Errors
///
/// See [`SmtpDriver::from_config`].
pub fn factory(raw: &DriverConfig) -> Result<Arc<dyn Driver>> {
    Ok(Arc::new(SmtpDriver::from_config(raw)?))
}

fn connection_error(context: &str, err: SmtpError) -> Error {
    Error::connection_failed(format!("{context}: {err}")).with_source(err)
}

/// Failures from MAIL FROM onward, dropped connections included, are send
/// failures. After DATA the server may already have queued the message.
fn send_error(context: &str, err: SmtpError) -> Error {
    Error::send_failed(format!("{context}: {err}")).with_source(err)
}

fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
}
