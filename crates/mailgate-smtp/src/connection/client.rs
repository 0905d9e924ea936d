//! Type-state SMTP client.

use super::{Capabilities, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Reply, ReplyCode};
use base64::Engine;
use std::marker::PhantomData;
use tracing::debug;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    capabilities: Capabilities,
    local_name: String,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns what the server advertised.
    fn capabilities(&self) -> &Capabilities;

    /// Returns true if the session runs over TLS.
    fn is_tls(&self) -> bool;
}

impl<S> SmtpConnection for Client<S> {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses service.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error("CONNECT"));
        }

        Ok(Self {
            stream,
            capabilities: Capabilities::from_banner(&greeting.message),
            local_name: String::new(),
            _state: PhantomData,
        })
    }

    /// Greets the server with EHLO, falling back to HELO if EHLO is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if both greetings are rejected.
    pub async fn hello(mut self, local_name: &str) -> Result<Self> {
        match self.send_ehlo(local_name).await {
            Ok(()) => Ok(self),
            Err(err @ Error::Rejected { .. }) => {
                debug!(error = %err, "EHLO rejected, falling back to HELO");
                self.send_helo(local_name).await?;
                Ok(self)
            }
            Err(err) => Err(err),
        }
    }

    /// Upgrades the connection to TLS using STARTTLS and greets again.
    ///
    /// `tls_hostname` is the name the server certificate is verified against.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised or the upgrade fails.
    pub async fn starttls(mut self, tls_hostname: &str) -> Result<Self> {
        if !self.capabilities.starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.expect(Command::StartTls).await?;
        self.stream = self.stream.upgrade_to_tls(tls_hostname).await?;

        // Capabilities learned before the upgrade must be discarded (RFC 3207).
        let local_name = self.local_name.clone();
        self.send_ehlo(&local_name).await?;
        Ok(self)
    }

    /// Authenticates using the PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Client<Authenticated>> {
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        self.expect(Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(encoded),
        })
        .await?;
        Ok(self.transition())
    }

    /// Starts a mail transaction without authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.expect(Command::MailFrom { from }).await?;
        Ok(self.transition())
    }

    async fn send_ehlo(&mut self, local_name: &str) -> Result<()> {
        let reply = self
            .expect(Command::Ehlo {
                hostname: local_name.to_string(),
            })
            .await?;

        // First line is the server greeting, the rest are extensions.
        self.capabilities.record_ehlo(&reply.message);
        local_name.clone_into(&mut self.local_name);
        Ok(())
    }

    async fn send_helo(&mut self, local_name: &str) -> Result<()> {
        self.expect(Command::Helo {
            hostname: local_name.to_string(),
        })
        .await?;
        self.capabilities.record_helo();
        local_name.clone_into(&mut self.local_name);
        Ok(())
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.expect(Command::MailFrom { from }).await?;
        Ok(self.transition())
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.expect(Command::RcptTo { to }).await?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.expect(Command::RcptTo { to }).await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer DATA with 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.command(&Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error("DATA"));
        }
        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the server rejects the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        self.stream.write_all(&dot_stuff(message)).await?;

        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(reply.into_error("DATA"));
        }
        Ok(self.transition())
    }
}

impl<S> Client<S> {
    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            capabilities: self.capabilities,
            local_name: self.local_name,
            _state: PhantomData,
        }
    }

    async fn command(&mut self, cmd: &Command) -> Result<Reply> {
        debug!(command = cmd.verb(), "smtp command");
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    /// Sends `cmd` and requires a 2xx reply.
    async fn expect(&mut self, cmd: Command) -> Result<Reply> {
        let reply = self.command(&cmd).await?;
        if !reply.is_success() {
            return Err(reply.into_error(cmd.verb()));
        }
        Ok(reply)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.command(&Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(reply.into_error("QUIT"));
        }
        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

/// Normalizes line endings to CRLF, dot-stuffs and terminates a DATA payload.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
