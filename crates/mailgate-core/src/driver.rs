//! Driver contract implemented by every transport.

use crate::config::DriverConfig;
use crate::context::SendContext;
use crate::error::Result;
use crate::message::{Message, SendResult};
use async_trait::async_trait;
use std::sync::Arc;

/// A transport capable of sending a [`Message`].
///
/// Instances are shared by every caller of the [`Manager`](crate::Manager),
/// so `send` must be safe to call concurrently.
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Returns the driver name.
    fn name(&self) -> &str;

    /// Checks the driver configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriverConfig`](crate::Error::DriverConfig) if the configuration is unusable.
    fn validate(&self) -> Result<()>;

    /// Sends `message` once.
    ///
    /// Implementations validate the message before performing any I/O.
    ///
    /// # Errors
    ///
    /// Returns a classified [`Error`](crate::Error). A
    /// [`SendFailed`](crate::Error::SendFailed) error may carry the provider's
    /// [`SendResult`].
    async fn send(&self, ctx: &SendContext, message: &Message) -> Result<SendResult>;
}

/// Constructor registered under a driver name.
pub type DriverFactory = Arc<dyn Fn(&DriverConfig) -> Result<Arc<dyn Driver>> + Send + Sync>;
