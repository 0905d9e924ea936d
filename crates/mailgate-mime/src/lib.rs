//! # mailgate-mime
//!
//! MIME document assembly for outgoing email.
//!
//! ## Features
//!
//! - **Message generation**: ordered headers, multipart/alternative and
//!   multipart/mixed bodies, inline and regular attachments
//! - **Encoding**: Base64 bodies wrapped at 76 columns, RFC 2047 header words
//! - **Content types**: parameters kept in order, quoted when needed
//! - **Header safety**: values that would start a new header line are rejected
//!
//! ## Quick Start
//!
//! ```
//! use mailgate_mime::{format_mailbox, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .from(format_mailbox("Sender", "sender@example.com"))
//!     .to("recipient@example.com")
//!     .subject("Test Message")
//!     .text_body("Plain text version")
//!     .html_body("<h1>HTML version</h1>")
//!     .build()?; // multipart/alternative
//!
//! let wire = message.to_string();
//! assert!(wire.contains("MIME-Version: 1.0\r\n"));
//! # Ok::<(), mailgate_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use boundary::generate_boundary;
pub use builder::{MessageBuilder, format_mailbox};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Attachment, Body, Disposition, Message, Part, TransferEncoding};
