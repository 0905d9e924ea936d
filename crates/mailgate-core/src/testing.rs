//! In-memory driver for tests.

use crate::context::SendContext;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::message::{Message, SendResult};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Driver that records messages instead of sending them.
#[derive(Debug)]
pub struct MockDriver {
    name: String,
    sent: Mutex<Vec<Message>>,
    reject_with: Option<String>,
}

impl MockDriver {
    /// Creates a driver that accepts every valid message.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Mutex::new(Vec::new()),
            reject_with: None,
        }
    }

    /// Creates a driver that rejects every valid message with `reason`.
    #[must_use]
    pub fn rejecting(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reject_with: Some(reason.into()),
            ..Self::new(name)
        }
    }

    /// Returns the messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn send(&self, ctx: &SendContext, message: &Message) -> Result<SendResult> {
        message.validate()?;
        ctx.run(async {
            let mut sent = self.sent.lock();
            sent.push(message.clone());
            let id = format!("mock-{}", sent.len());
            match &self.reject_with {
                Some(reason) => Err(Error::send_failed(reason.clone())
                    .with_result(SendResult::new(id, "rejected", false))),
                None => Ok(SendResult::new(id, "sent", true)),
            }
        })
        .await
    }
}
