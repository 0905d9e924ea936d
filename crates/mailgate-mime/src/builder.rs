//! Composition of outgoing MIME messages.

use crate::boundary::generate_boundary;
use crate::content_type::ContentType;
use crate::encoding::{encode_rfc2047, needs_encoding};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Attachment, Message, Part};
use chrono::{DateTime, FixedOffset};

/// Characters that force a display name into a quoted string (RFC 5322 specials).
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Formats a mailbox as `Display Name <address>`.
///
/// An empty name yields the bare address. Non-ASCII names are RFC 2047
/// encoded; names with specials are quoted.
#[must_use]
pub fn format_mailbox(name: &str, address: &str) -> String {
    if name.is_empty() {
        return address.to_string();
    }
    if needs_encoding(name) {
        return format!("{} <{address}>", encode_rfc2047(name, "UTF-8"));
    }
    if name.contains(|c| SPECIALS.contains(c)) {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{escaped}\" <{address}>");
    }
    format!("{name} <{address}>")
}

/// Builder for outgoing messages.
///
/// Top-level headers are written in a fixed order: From, To, Cc, Subject,
/// Reply-To, Date, Message-ID, custom headers, MIME-Version, Content-Type.
/// A custom `Date` or `Message-ID` header replaces the generated one.
///
/// The body is chosen from what was set: both bodies give
/// `multipart/alternative` (text first), otherwise a single HTML or text part.
/// Attachments wrap that body in `multipart/mixed`.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    reply_to: Option<String>,
    subject: Option<String>,
    date: Option<DateTime<FixedOffset>>,
    message_id: Option<String>,
    headers: Vec<(String, String)>,
    text_body: Option<String>,
    html_body: Option<String>,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From mailbox, already formatted (see [`format_mailbox`]).
    pub fn from(mut self, mailbox: impl Into<String>) -> Self {
        self.from = Some(mailbox.into());
        self
    }

    /// Adds a To recipient.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Adds a Cc recipient.
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Sets the Reply-To address.
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Sets the subject. Non-ASCII text is RFC 2047 encoded on build.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the Date header.
    pub fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the Message-ID. Angle brackets are added when missing.
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Adds a custom header, written verbatim.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the plain text body.
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text_body = Some(text.into());
        self
    }

    /// Sets the HTML body.
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Adds an attachment.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRecipients`] without a To recipient, or
    /// [`Error::InvalidHeader`] if a header name or value is malformed.
    pub fn build(self) -> Result<Message> {
        if self.to.is_empty() {
            return Err(Error::NoRecipients);
        }

        let has_custom = |name: &str| self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name));
        let mut headers = Headers::new();

        if let Some(from) = &self.from {
            headers.add("From", from.as_str())?;
        }
        headers.add("To", self.to.join(", "))?;
        if !self.cc.is_empty() {
            headers.add("Cc", self.cc.join(", "))?;
        }
        headers.add("Subject", encode_rfc2047(self.subject.as_deref().unwrap_or_default(), "UTF-8"))?;
        if let Some(reply_to) = &self.reply_to {
            headers.add("Reply-To", reply_to.as_str())?;
        }
        if let Some(date) = &self.date
            && !has_custom("Date")
        {
            headers.add("Date", date.to_rfc2822())?;
        }
        if let Some(id) = &self.message_id
            && !has_custom("Message-ID")
        {
            let id = if id.starts_with('<') { id.clone() } else { format!("<{id}>") };
            headers.add("Message-ID", id)?;
        }
        for (name, value) in &self.headers {
            headers.add(name.as_str(), value.as_str())?;
        }

        let mut body = match (self.text_body.as_deref(), self.html_body.as_deref()) {
            (Some(text), Some(html)) if !text.is_empty() && !html.is_empty() => Part::multipart(
                &ContentType::multipart_alternative(generate_boundary()),
                vec![Part::text(text)?, Part::html(html)?],
            )?,
            (_, Some(html)) if !html.is_empty() => Part::html(html)?,
            (text, _) => Part::text(text.unwrap_or_default())?,
        };

        if !self.attachments.is_empty() {
            let mut parts = Vec::with_capacity(self.attachments.len() + 1);
            parts.push(body);
            for attachment in self.attachments {
                parts.push(attachment.into_part()?);
            }
            body = Part::multipart(&ContentType::multipart_mixed(generate_boundary()), parts)?;
        }

        Ok(Message { headers, body })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::encoding::decode_rfc2047;
    use crate::message::Body;
    use proptest::prelude::*;

    fn header_names(message: &Message) -> Vec<String> {
        message.headers.iter().map(|(n, _)| n.to_string()).collect()
    }

    #[test]
    fn test_format_mailbox() {
        assert_eq!(format_mailbox("", "a@example.com"), "a@example.com");
        assert_eq!(format_mailbox("Alice", "a@example.com"), "Alice <a@example.com>");
        assert_eq!(
            format_mailbox("Doe, Jane", "j@example.com"),
            "\"Doe, Jane\" <j@example.com>"
        );
        assert_eq!(
            format_mailbox("张三", "z@example.com"),
            "=?UTF-8?B?5byg5LiJ?= <z@example.com>"
        );
    }

    #[test]
    fn test_header_order() {
        let date = DateTime::parse_from_rfc2822("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        let message = MessageBuilder::new()
            .from("Alice <a@example.com>")
            .to("b@example.com")
            .cc("c@example.com")
            .subject("Hi")
            .reply_to("r@example.com")
            .date(date)
            .message_id("id-1@example.com")
            .header("X-Campaign", "spring")
            .text_body("hello")
            .build()
            .unwrap();

        assert_eq!(
            header_names(&message),
            vec!["From", "To", "Cc", "Subject", "Reply-To", "Date", "Message-ID", "X-Campaign"]
        );
        assert_eq!(message.header("Message-ID"), Some("<id-1@example.com>"));
        let rendered = message.to_string();
        assert!(rendered.contains("X-Campaign: spring\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=UTF-8\r\n"));
    }

    #[test]
    fn test_custom_date_and_message_id_win() {
        let date = DateTime::parse_from_rfc2822("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        let message = MessageBuilder::new()
            .to("b@example.com")
            .subject("Hi")
            .date(date)
            .message_id("generated")
            .header("Message-ID", "<custom@example.com>")
            .header("date", "Wed, 2 Jul 2003 10:52:37 +0200")
            .text_body("hello")
            .build()
            .unwrap();

        assert_eq!(message.headers.get_all("Message-ID"), vec!["<custom@example.com>"]);
        assert_eq!(message.headers.get_all("Date"), vec!["Wed, 2 Jul 2003 10:52:37 +0200"]);
    }

    #[test]
    fn test_requires_to() {
        let err = MessageBuilder::new().subject("Hi").text_body("x").build().unwrap_err();
        assert!(matches!(err, Error::NoRecipients));
    }

    #[test]
    fn test_rejects_injected_header() {
        let result = MessageBuilder::new()
            .to("b@example.com")
            .header("X-Note", "a\r\nBcc: evil@example.com")
            .text_body("x")
            .build();
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_alternative_body() {
        let message = MessageBuilder::new()
            .to("b@example.com")
            .subject("Hi")
            .text_body("plain")
            .html_body("<p>html</p>")
            .build()
            .unwrap();

        let ct = message.content_type().unwrap();
        assert_eq!(ct.essence(), "multipart/alternative");
        let parts = message.body.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].content_type().unwrap().essence(), "text/plain");
        assert_eq!(parts[1].content_type().unwrap().essence(), "text/html");
    }

    #[test]
    fn test_html_only_and_text_only() {
        let html = MessageBuilder::new().to("b@example.com").html_body("<p>x</p>").build().unwrap();
        assert_eq!(html.content_type().unwrap().essence(), "text/html");

        let text = MessageBuilder::new().to("b@example.com").text_body("x").build().unwrap();
        assert_eq!(text.content_type().unwrap().essence(), "text/plain");

        let empty_html = MessageBuilder::new()
            .to("b@example.com")
            .text_body("x")
            .html_body("")
            .build()
            .unwrap();
        assert_eq!(empty_html.content_type().unwrap().essence(), "text/plain");
    }

    #[test]
    fn test_mixed_with_attachments() {
        let message = MessageBuilder::new()
            .to("b@example.com")
            .subject("Files")
            .text_body("plain")
            .html_body("<img src=\"cid:logo\">")
            .attach(Attachment::inline("logo", "logo.png", ContentType::new("image", "png"), vec![1, 2, 3]))
            .attach(Attachment::new("a.txt", ContentType::new("text", "plain"), b"a".to_vec()))
            .build()
            .unwrap();

        let outer = message.content_type().unwrap();
        assert_eq!(outer.essence(), "multipart/mixed");
        let parts = message.body.parts();
        assert_eq!(parts.len(), 3);

        let inner = parts[0].content_type().unwrap();
        assert_eq!(inner.essence(), "multipart/alternative");
        assert_ne!(inner.boundary(), outer.boundary());

        assert_eq!(parts[1].headers.get("Content-ID"), Some("<logo>"));
        assert!(parts[1].headers.get("Content-Disposition").unwrap().starts_with("inline"));
        assert!(parts[2].headers.get("Content-Disposition").unwrap().starts_with("attachment"));
        assert!(matches!(parts[2].body, Body::Encoded(_)));

        let rendered = message.to_string();
        assert_eq!(rendered.matches("Content-Disposition: inline").count(), 1);
        assert_eq!(rendered.matches("Content-Disposition: attachment").count(), 1);
    }

    #[test]
    fn test_subject_encoded() {
        let message = MessageBuilder::new()
            .to("b@example.com")
            .subject("你好")
            .text_body("x")
            .build()
            .unwrap();
        let subject = message.header("Subject").unwrap();
        assert!(subject.starts_with("=?UTF-8?B?"));
        assert_eq!(decode_rfc2047(subject).unwrap(), "你好");
    }

    proptest! {
        #[test]
        fn prop_subject_never_breaks_headers(subject in "\\PC{0,200}") {
            let message = MessageBuilder::new()
                .to("b@example.com")
                .subject(subject.clone())
                .text_body("x")
                .build()
                .unwrap();
            let rendered = message.to_string();
            let head = rendered.split("\r\n\r\n").next().unwrap();
            prop_assert!(head.split("\r\n").all(|line| line.starts_with(' ') || line.contains(':')));
        }
    }
}
