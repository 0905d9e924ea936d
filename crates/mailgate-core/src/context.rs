//! Deadline and cancellation for a single send.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied limits for one `send` call.
///
/// Drivers run their network I/O through [`SendContext::run`], so an expired
/// deadline or a cancelled token aborts the in-flight request and surfaces
/// as [`Error::Timeout`].
#[derive(Debug, Clone, Default)]
pub struct SendContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl SendContext {
    /// Creates a context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Uses `token` for cancellation.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns true once the token is cancelled or the deadline has passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drives `fut` until it completes, the deadline passes, or the token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the context finishes first, otherwise the
    /// future's own error.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::timeout("send cancelled")),
            () = expired => Err(Error::timeout("deadline exceeded")),
            out = fut => out,
        }
    }
}
