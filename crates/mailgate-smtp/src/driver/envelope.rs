//! Conversion of a [`mailgate_core::Message`] into SMTP envelope and MIME document.

use crate::types::Address;
use chrono::{DateTime, FixedOffset};
use mailgate_core::{Error, Message, Result};
use mailgate_mime::{Attachment, ContentType, MessageBuilder, format_mailbox};

/// Envelope sender and recipients for one SMTP transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `MAIL FROM` address; the null path when the message has no sender.
    pub from: Address,
    /// `RCPT TO` addresses: To, then Cc, then Bcc.
    pub recipients: Vec<Address>,
}

impl Envelope {
    /// Collects the envelope from a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessage`] for a malformed sender and
    /// [`Error::InvalidRecipient`] naming the first malformed recipient.
    pub fn from_message(message: &Message) -> Result<Self> {
        let from = if message.from.is_empty() {
            Address::null()
        } else {
            Address::new(message.from.as_str())
                .map_err(|e| Error::InvalidMessage(format!("invalid sender {}: {e}", message.from)))?
        };

        let recipients = message
            .all_recipients()
            .map(|rcpt| {
                Address::new(rcpt)
                    .map_err(|e| Error::InvalidRecipient(format!("invalid recipient {rcpt}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { from, recipients })
    }
}

/// Renders the MIME document for `message`.
///
/// Bcc recipients never appear in the headers. `message_id` and `date` are
/// only written when the caller did not supply those headers.
///
/// # Errors
///
/// Returns [`Error::InvalidMessage`] if a header or attachment content type
/// is malformed.
pub fn render(message: &Message, message_id: &str, date: DateTime<FixedOffset>) -> Result<Vec<u8>> {
    let mut builder = MessageBuilder::new()
        .subject(message.subject.as_str())
        .date(date)
        .message_id(message_id);

    if !message.from.is_empty() {
        builder = builder.from(format_mailbox(&message.from_name, &message.from));
    }
    for to in &message.to {
        builder = builder.to(to.as_str());
    }
    for cc in &message.cc {
        builder = builder.cc(cc.as_str());
    }
    if !message.reply_to.is_empty() {
        builder = builder.reply_to(message.reply_to.as_str());
    }
    for (name, value) in &message.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !message.body_text.is_empty() {
        builder = builder.text_body(message.body_text.as_str());
    }
    if !message.body_html.is_empty() {
        builder = builder.html_body(message.body_html.as_str());
    }

    for attachment in &message.attachments {
        let content_type = ContentType::parse(attachment.content_type_or_default()).map_err(|e| {
            Error::InvalidMessage(format!("attachment {}: {e}", attachment.filename))
        })?;
        let part = if attachment.inline {
            Attachment::inline(
                attachment.reference_name(),
                attachment.filename.as_str(),
                content_type,
                attachment.content.clone(),
            )
        } else {
            Attachment::new(attachment.filename.as_str(), content_type, attachment.content.clone())
        };
        builder = builder.attach(part);
    }

    let document = builder
        .build()
        .map_err(|e| Error::InvalidMessage(e.to_string()))?;
    Ok(document.to_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use mailgate_core::ErrorKind;
    use mailgate_mime::Headers;

    fn date() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Tue, 1 Jul 2003 10:52:37 +0200").unwrap()
    }

    fn base() -> Message {
        let mut message = Message::new().to("to@example.com");
        message.from = "from@example.com".into();
        message.subject = "Report".into();
        message.body_text = "plain".into();
        message
    }

    fn render_str(message: &Message) -> String {
        String::from_utf8(render(message, "smtp-1@localhost", date()).unwrap()).unwrap()
    }

    #[test]
    fn test_envelope_order_includes_bcc() {
        let message = base().cc("cc@example.com").bcc("bcc@example.com");
        let envelope = Envelope::from_message(&message).unwrap();
        let rcpts: Vec<&str> = envelope.recipients.iter().map(Address::as_str).collect();
        assert_eq!(rcpts, vec!["to@example.com", "cc@example.com", "bcc@example.com"]);
        assert_eq!(envelope.from.as_str(), "from@example.com");
    }

    #[test]
    fn test_envelope_rejects_malformed_recipient() {
        let message = base().bcc("not an address");
        let err = Envelope::from_message(&message).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecipient);
        assert!(err.to_string().contains("not an address"));
    }

    #[test]
    fn test_envelope_null_sender() {
        let mut message = base();
        message.from.clear();
        assert_eq!(Envelope::from_message(&message).unwrap().from, Address::null());
    }

    #[test]
    fn test_headers_exclude_bcc() {
        let message = base().cc("cc@example.com").bcc("hidden@example.com");
        let rendered = render_str(&message);
        let head = rendered.split("\r\n\r\n").next().unwrap();
        let headers = Headers::parse(head).unwrap();

        assert_eq!(headers.get("To"), Some("to@example.com"));
        assert_eq!(headers.get("Cc"), Some("cc@example.com"));
        assert!(!headers.contains("Bcc"));
        assert!(!rendered.contains("hidden@example.com"));
        assert_eq!(headers.get("Message-ID"), Some("<smtp-1@localhost>"));
        assert_eq!(headers.get("Date"), Some("Tue, 1 Jul 2003 10:52:37 +0200"));
    }

    #[test]
    fn test_from_name_encoded() {
        let mut message = base();
        message.from_name = "Équipe".into();
        let rendered = render_str(&message);
        assert!(rendered.starts_with("From: =?UTF-8?B?"));
        assert!(rendered.contains("<from@example.com>\r\n"));
    }

    #[test]
    fn test_alternative_body() {
        let mut message = base();
        message.body_html = "<p>html</p>".into();
        let rendered = render_str(&message);
        assert_eq!(rendered.matches("Content-Type: multipart/alternative").count(), 1);
        assert_eq!(rendered.matches("Content-Type: text/plain").count(), 1);
        assert_eq!(rendered.matches("Content-Type: text/html").count(), 1);
        assert!(rendered.find("text/plain").unwrap() < rendered.find("text/html").unwrap());
    }

    #[test]
    fn test_attachments() {
        let mut message = base();
        message.attachments.push(
            mailgate_core::Attachment::inline("logo", "logo.png", vec![1, 2, 3])
                .with_content_type("image/png"),
        );
        message
            .attachments
            .push(mailgate_core::Attachment::new("data.bin", vec![0; 10]));
        let rendered = render_str(&message);

        assert!(rendered.contains("Content-Type: multipart/mixed"));
        assert!(rendered.contains("Content-Disposition: inline; filename=\"logo.png\""));
        assert!(rendered.contains("Content-ID: <logo>"));
        assert!(rendered.contains("Content-Disposition: attachment; filename=\"data.bin\""));
        assert!(rendered.contains("Content-Type: application/octet-stream; name=data.bin"));
    }

    #[test]
    fn test_malformed_attachment_type() {
        let mut message = base();
        message
            .attachments
            .push(mailgate_core::Attachment::new("x", vec![1]).with_content_type("nonsense"));
        let err = render(&message, "id", date()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMessage);
    }

    #[test]
    fn test_custom_header_injection_rejected() {
        let mut message = base();
        message.headers.insert("X-Tag".into(), "a\r\nBcc: x@example.com".into());
        let err = render(&message, "id", date()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMessage);
    }

    #[test]
    fn test_custom_message_id_kept() {
        let mut message = base();
        message.headers.insert("Message-ID".into(), "<mine@example.com>".into());
        let rendered = render_str(&message);
        assert_eq!(rendered.matches("Message-ID:").count(), 1);
        assert!(rendered.contains("Message-ID: <mine@example.com>"));
    }
}
