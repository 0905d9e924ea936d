//! # mailgate-smtp
//!
//! SMTP transport for mailgate.
//!
//! The crate has two layers:
//!
//! - A small RFC 5321 client ([`Client`]) that encodes the session state in
//!   its type, so commands can only be issued in a valid order
//! - The [`SmtpDriver`], which implements [`mailgate_core::Driver`] by
//!   rendering a MIME document and running one transaction per send
//!
//! ## Using the client directly
//!
//! ```ignore
//! use mailgate_smtp::{Address, Client};
//! use mailgate_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailgate_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream)
//!         .await?
//!         .hello("client.example.com")
//!         .await?
//!         .starttls("smtp.example.com")
//!         .await?
//!         .auth_plain("user@example.com", "password")
//!         .await?;
//!
//!     let client = client
//!         .mail_from(Address::new("sender@example.com")?)
//!         .await?
//!         .rcpt_to(Address::new("recipient@example.com")?)
//!         .await?
//!         .data()
//!         .await?
//!         .send_message(b"Subject: Test\r\n\r\nHello, World!\r\n")
//!         .await?;
//!
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_plain() ───→ Authenticated
//! └──────────────┘                             │
//!        │                                     │
//!        └─── mail_from() ───→ MailTransaction ←┘
//!                                    │
//!                                rcpt_to() ───→ RecipientAdded ─── data() ───→ Data
//! ```
//!
//! ## Driver configuration
//!
//! | key          | meaning                                  | default     |
//! |--------------|------------------------------------------|-------------|
//! | `host`       | server host name (required)              |             |
//! | `port`       | server port                              | 25          |
//! | `username`   | login name                               |             |
//! | `password`   | login password                           |             |
//! | `security`   | `none`, `tls` or `starttls`              | `none`      |
//! | `timeout`    | dial timeout, e.g. `"10s"`               | 30s         |
//! | `local_name` | EHLO host name                           | `localhost` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod driver;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Capabilities, Client, Connected, Data, MailTransaction, RecipientAdded,
    SmtpConnection,
};
pub use driver::{
    DEFAULT_PORT, DEFAULT_TIMEOUT, DRIVER_NAME, Envelope, Security, SmtpConfig, SmtpDriver,
    factory, render,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
