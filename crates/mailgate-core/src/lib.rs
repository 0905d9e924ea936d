//! # mailgate-core
//!
//! Provider-agnostic mail dispatch primitives.
//!
//! This crate provides:
//! - The vendor-neutral [`Message`] model and its validation
//! - The [`Driver`] contract every transport implements
//! - A [`Registry`] mapping driver names to factories
//! - A [`Manager`] that turns configuration into cached driver instances
//! - A [`Builder`] for composing and sending a message through the manager
//!
//! Transports live in their own crates (`mailgate-smtp`, `mailgate-mandrill`).
//!
//! ## Control flow
//!
//! ```text
//! Builder ─→ Manager::get_driver ─→ Registry::create ─→ Driver::send ─→ SendResult
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
pub mod config;
mod context;
mod driver;
mod error;
mod manager;
mod message;
mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builder::Builder;
pub use config::{DriverConfig, MailConfig};
pub use context::SendContext;
pub use driver::{Driver, DriverFactory};
pub use error::{BoxError, Error, ErrorKind, Result};
pub use manager::Manager;
pub use message::{Attachment, DEFAULT_ATTACHMENT_TYPE, Message, SendResult};
pub use registry::{Registry, default_registry};

/// Re-exported so transport crates implement [`Driver`] with the same macro.
pub use async_trait::async_trait;
/// Re-exported for callers building a [`SendContext`].
pub use tokio_util::sync::CancellationToken;
