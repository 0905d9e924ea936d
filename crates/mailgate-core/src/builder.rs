//! Message builder bound to a [`Manager`].

use crate::context::SendContext;
use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::message::{Attachment, Message, SendResult};

/// Accumulates a message and sends it through a managed driver.
///
/// Each call consumes and returns the builder. The first invalid input is
/// recorded, later calls are ignored, and [`Builder::send`] reports it without
/// resolving a driver.
///
/// ```ignore
/// let result = manager
///     .builder()
///     .to(["user@example.com"])
///     .subject("Welcome")
///     .html("<h1>Hello</h1>")
///     .send(&SendContext::new())
///     .await?;
/// ```
#[derive(Debug)]
#[must_use]
pub struct Builder<'a> {
    manager: &'a Manager,
    driver: String,
    message: Message,
    error: Option<Error>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(manager: &'a Manager, driver: String) -> Self {
        Self {
            manager,
            driver,
            message: Message::default(),
            error: None,
        }
    }

    fn apply(mut self, f: impl FnOnce(&mut Message) -> Result<()>) -> Self {
        if self.error.is_none() {
            if let Err(err) = f(&mut self.message) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Selects the driver to send with.
    pub fn driver(mut self, name: impl Into<String>) -> Self {
        if self.error.is_none() {
            self.driver = name.into();
        }
        self
    }

    /// Sets the sender address.
    pub fn from(self, address: impl Into<String>) -> Self {
        let address = address.into();
        self.apply(|m| {
            m.from = address;
            Ok(())
        })
    }

    /// Sets the sender display name.
    pub fn from_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.apply(|m| {
            m.from_name = name;
            Ok(())
        })
    }

    /// Adds recipients.
    pub fn to<I, S>(self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses = collect_addresses(addresses);
        self.apply(|m| extend_recipients(&mut m.to, addresses))
    }

    /// Adds CC recipients.
    pub fn cc<I, S>(self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses = collect_addresses(addresses);
        self.apply(|m| extend_recipients(&mut m.cc, addresses))
    }

    /// Adds BCC recipients.
    pub fn bcc<I, S>(self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses = collect_addresses(addresses);
        self.apply(|m| extend_recipients(&mut m.bcc, addresses))
    }

    /// Sets the Reply-To address.
    pub fn reply_to(self, address: impl Into<String>) -> Self {
        let address = address.into();
        self.apply(|m| {
            m.reply_to = address;
            Ok(())
        })
    }

    /// Sets the subject.
    pub fn subject(self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        self.apply(|m| {
            m.subject = subject;
            Ok(())
        })
    }

    /// Sets the HTML body.
    pub fn html(self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.apply(|m| {
            m.body_html = body;
            Ok(())
        })
    }

    /// Sets the plain text body.
    pub fn text(self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.apply(|m| {
            m.body_text = body;
            Ok(())
        })
    }

    /// Adds a file attachment.
    pub fn attach(self, filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.attachment(Attachment::new(filename, content))
    }

    /// Adds a file attachment with an explicit MIME type.
    pub fn attach_with_type(
        self,
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        self.attachment(Attachment::new(filename, content).with_content_type(content_type))
    }

    /// Adds an inline attachment referenced as `cid:{content_id}`.
    pub fn embed(
        self,
        content_id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.attachment(Attachment::inline(content_id, filename, content))
    }

    /// Adds an inline attachment with an explicit MIME type.
    pub fn embed_with_type(
        self,
        content_id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        self.attachment(
            Attachment::inline(content_id, filename, content).with_content_type(content_type),
        )
    }

    /// Adds a prepared attachment.
    pub fn attachment(self, attachment: Attachment) -> Self {
        self.apply(|m| {
            m.attachments.push(attachment);
            Ok(())
        })
    }

    /// Sets a custom header, replacing a previous value under the same name.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.apply(|m| {
            if name.trim().is_empty() {
                return Err(Error::InvalidMessage("header name is empty".into()));
            }
            m.headers.insert(name, value);
            Ok(())
        })
    }

    /// Returns the message built so far.
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// Returns the first recorded error, if any.
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Finishes the message without sending it.
    ///
    /// The configured default sender is applied when none was set.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building.
    pub fn build(self) -> Result<Message> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut message = self.message;
        let config = self.manager.config();
        if message.from.is_empty() && !config.default_from.is_empty() {
            message.from.clone_from(&config.default_from);
        }
        if message.from_name.is_empty() && !config.default_from_name.is_empty() {
            message.from_name.clone_from(&config.default_from_name);
        }
        Ok(message)
    }

    /// Resolves the driver and sends the message.
    ///
    /// # Errors
    ///
    /// Returns the first recorded build error, a driver lookup error, or the
    /// driver's send error.
    pub async fn send(self, ctx: &SendContext) -> Result<SendResult> {
        let manager = self.manager;
        let driver_name = if self.driver.is_empty() {
            manager.config().default_driver.clone()
        } else {
            self.driver.clone()
        };
        let message = self.build()?;
        let driver = manager.get_driver(&driver_name)?;
        driver.send(ctx, &message).await
    }
}

fn collect_addresses<I, S>(addresses: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    addresses.into_iter().map(Into::into).collect()
}

fn extend_recipients(list: &mut Vec<String>, addresses: Vec<String>) -> Result<()> {
    if let Some(bad) = addresses.iter().find(|a| a.trim().is_empty()) {
        return Err(Error::InvalidRecipient(format!("empty address {bad:?}")));
    }
    list.extend(addresses);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::config::{DriverConfig, MailConfig};
    use crate::driver::Driver;
    use crate::error::ErrorKind;
    use crate::registry::Registry;
    use crate::testing::MockDriver;
    use std::sync::Arc;

    fn manager_with(mock: &Arc<MockDriver>) -> Manager {
        let registry = Registry::new();
        let shared = Arc::clone(mock);
        registry.register("mock", move |_| Ok(Arc::clone(&shared) as Arc<dyn Driver>));
        let config = MailConfig::new("mock")
            .default_from("default@example.com", "Default")
            .driver("mock", DriverConfig::new());
        Manager::new(config, Arc::new(registry)).unwrap()
    }

    #[test]
    fn test_accumulates_fields() {
        let mock = Arc::new(MockDriver::new("mock"));
        let manager = manager_with(&mock);
        let builder = manager
            .builder()
            .from("me@example.com")
            .from_name("Me")
            .to(["a@example.com", "b@example.com"])
            .cc(["c@example.com"])
            .bcc(vec!["d@example.com".to_string()])
            .reply_to("reply@example.com")
            .subject("Hello")
            .html("<p>Hi</p>")
            .text("Hi")
            .attach("a.txt", b"a".to_vec())
            .attach_with_type("b.pdf", b"b".to_vec(), "application/pdf")
            .embed("logo", "logo.png", vec![1u8])
            .embed_with_type("icon", "icon.gif", vec![2u8], "image/gif")
            .header("X-Campaign", "launch");

        let msg = builder.message();
        assert_eq!(msg.to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(msg.cc, vec!["c@example.com"]);
        assert_eq!(msg.bcc, vec!["d@example.com"]);
        assert_eq!(msg.attachments.len(), 4);
        assert!(msg.attachments[2].inline);
        assert_eq!(msg.attachments[3].content_type.as_deref(), Some("image/gif"));
        assert_eq!(msg.headers.get("X-Campaign").map(String::as_str), Some("launch"));
        assert!(builder.error().is_none());
    }

    #[test]
    fn test_build_applies_default_sender() {
        let mock = Arc::new(MockDriver::new("mock"));
        let manager = manager_with(&mock);
        let msg = manager.builder().to(["a@example.com"]).build().unwrap();
        assert_eq!(msg.from, "default@example.com");
        assert_eq!(msg.from_name, "Default");

        let msg = manager.builder().from("me@example.com").build().unwrap();
        assert_eq!(msg.from, "me@example.com");
        assert_eq!(msg.from_name, "Default");
    }

    #[test]
    fn test_first_error_short_circuits() {
        let mock = Arc::new(MockDriver::new("mock"));
        let manager = manager_with(&mock);
        let builder = manager
            .builder()
            .to(["ok@example.com", " "])
            .header("", "ignored")
            .subject("never applied");

        assert_eq!(builder.error().unwrap().kind(), ErrorKind::InvalidRecipient);
        assert!(builder.message().subject.is_empty());
        assert!(builder.message().to.is_empty());
    }

    #[tokio::test]
    async fn test_send_uses_default_driver() {
        let mock = Arc::new(MockDriver::new("mock"));
        let manager = manager_with(&mock);
        let result = manager
            .builder()
            .to(["a@example.com"])
            .subject("Hello")
            .text("Hi")
            .send(&SendContext::new())
            .await
            .unwrap();

        assert!(result.success);
        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "default@example.com");
    }

    #[tokio::test]
    async fn test_send_reports_build_error_without_driver() {
        let manager = Manager::new(MailConfig::default(), Arc::new(Registry::new())).unwrap();
        let err = manager
            .builder()
            .header(" ", "x")
            .send(&SendContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMessage);
    }

    #[tokio::test]
    async fn test_send_unknown_driver() {
        let mock = Arc::new(MockDriver::new("mock"));
        let manager = manager_with(&mock);
        let err = manager
            .builder()
            .driver("smtp")
            .to(["a@example.com"])
            .subject("Hello")
            .text("Hi")
            .send(&SendContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverNotFound);
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_invalid_message_rejected_by_driver() {
        let mock = Arc::new(MockDriver::new("mock"));
        let manager = manager_with(&mock);
        let err = manager
            .builder()
            .to(["a@example.com"])
            .text("no subject")
            .send(&SendContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMessage);
        assert!(mock.sent().is_empty());
    }
}
