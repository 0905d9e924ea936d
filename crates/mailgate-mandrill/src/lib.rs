//! # mailgate-mandrill
//!
//! HTTP transactional mail driver for mailgate, speaking the Mandrill
//! (Mailchimp Transactional) JSON API.
//!
//! A send is a single `POST {base_url}/messages/send.json`. The response is a
//! per-recipient status array, of which the first record decides the
//! outcome: `sent`, `queued` and `scheduled` are successes, anything else is
//! returned as a [`mailgate_core::Error::SendFailed`] carrying the
//! [`mailgate_core::SendResult`].
//!
//! ## Configuration
//!
//! | key        | meaning                          | default                           |
//! |------------|----------------------------------|-----------------------------------|
//! | `api_key`  | API key (required)               |                                   |
//! | `base_url` | API base URL                     | `https://mandrillapp.com/api/1.0` |
//! | `timeout`  | request timeout, e.g. `"10s"`    | 30s                               |
//!
//! ## Example
//!
//! ```no_run
//! use mailgate_core::{Driver, Message, SendContext};
//! use mailgate_mandrill::{MandrillConfig, MandrillDriver};
//!
//! # async fn run() -> mailgate_core::Result<()> {
//! let driver = MandrillDriver::new(MandrillConfig::new("md-api-key"))?;
//!
//! let mut message = Message::new().to("user@example.com");
//! message.from = "noreply@example.com".into();
//! message.subject = "Welcome".into();
//! message.body_html = "<h1>Hello</h1>".into();
//!
//! let result = driver.send(&SendContext::new(), &message).await?;
//! println!("accepted as {}", result.message_id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod driver;
mod error;
pub mod payload;

pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, MandrillConfig};
pub use driver::{DRIVER_NAME, MandrillDriver, factory};
pub use error::{Error, Result};
