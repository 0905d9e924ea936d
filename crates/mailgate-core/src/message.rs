//! Vendor-neutral message model.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Content type used for attachments that do not declare one.
pub const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

/// An email message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Sender address.
    pub from: String,
    /// Sender display name.
    pub from_name: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses.
    pub bcc: Vec<String>,
    /// Reply-To address.
    pub reply_to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub body_html: String,
    /// Plain text body.
    pub body_text: String,
    /// Attachments, in order.
    pub attachments: Vec<Attachment>,
    /// Custom headers; names are kept exactly as given.
    pub headers: BTreeMap<String, String>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Checks the message can be handed to a transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecipient`] if there are no `to` recipients and
    /// [`Error::InvalidMessage`] if the subject or both bodies are empty.
    pub fn validate(&self) -> Result<()> {
        if self.to.is_empty() {
            return Err(Error::InvalidRecipient("recipient list is empty".into()));
        }
        if self.subject.is_empty() {
            return Err(Error::InvalidMessage("subject is empty".into()));
        }
        if self.body_html.is_empty() && self.body_text.is_empty() {
            return Err(Error::InvalidMessage("message body is empty".into()));
        }
        Ok(())
    }

    /// Returns all envelope recipients (to, cc, bcc).
    pub fn all_recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
    }

    /// Returns true if the message has at least one attachment.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// Raw content.
    pub content: Vec<u8>,
    /// MIME type; [`DEFAULT_ATTACHMENT_TYPE`] is used when unset.
    pub content_type: Option<String>,
    /// Whether the attachment is referenced from the HTML body.
    pub inline: bool,
    /// Identifier for `cid:` references.
    pub content_id: Option<String>,
}

impl Attachment {
    /// Creates a regular file attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Creates an inline attachment addressed by `content_id`.
    #[must_use]
    pub fn inline(
        content_id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            inline: true,
            content_id: Some(content_id.into()),
            ..Self::default()
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the declared MIME type, or the generic binary type.
    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() => ct,
            _ => DEFAULT_ATTACHMENT_TYPE,
        }
    }

    /// Returns the content id if set, otherwise the file name.
    #[must_use]
    pub fn reference_name(&self) -> &str {
        match self.content_id.as_deref() {
            Some(cid) if !cid.is_empty() => cid,
            _ => &self.filename,
        }
    }
}

/// Outcome of a single send attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    /// Provider-assigned message identifier.
    pub message_id: String,
    /// Provider status string.
    pub status: String,
    /// Whether the provider accepted the message.
    pub success: bool,
}

impl SendResult {
    /// Creates a new result.
    #[must_use]
    pub fn new(message_id: impl Into<String>, status: impl Into<String>, success: bool) -> Self {
        Self {
            message_id: message_id.into(),
            status: status.into(),
            success,
        }
    }
}
