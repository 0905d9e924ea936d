//! Request and response bodies of `messages/send.json`.

use crate::error::{Error, Result};
use base64::Engine;
use mailgate_core::{Message, SendResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statuses that count as accepted.
const ACCEPTED: [&str; 3] = ["sent", "queued", "scheduled"];

/// Top-level request body.
#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
    /// API key.
    pub key: &'a str,
    /// Message envelope.
    pub message: MessagePayload<'a>,
}

/// The `message` object of a send request.
#[derive(Debug, Serialize)]
pub struct MessagePayload<'a> {
    /// Subject line.
    pub subject: &'a str,
    /// Sender address.
    pub from_email: &'a str,
    /// Sender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<&'a str>,
    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<&'a str>,
    /// Plain-text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    /// All recipients, To then Cc then Bcc.
    pub to: Vec<Recipient<'a>>,
    /// Extra headers, including `Reply-To`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<&'a str, &'a str>,
    /// Regular attachments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FilePayload<'a>>,
    /// Inline images, referenced from HTML as `cid:<name>`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<FilePayload<'a>>,
}

/// Recipient kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    /// Primary recipient.
    To,
    /// Carbon copy.
    Cc,
    /// Blind carbon copy.
    Bcc,
}

/// One entry of the recipient list.
#[derive(Debug, Serialize)]
pub struct Recipient<'a> {
    /// Address.
    pub email: &'a str,
    /// Kind.
    #[serde(rename = "type")]
    pub kind: RecipientType,
}

/// An attachment or inline image.
#[derive(Debug, Serialize)]
pub struct FilePayload<'a> {
    /// MIME type, when known.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'a str>,
    /// File name, or the content ID for inline images.
    pub name: &'a str,
    /// Base64 content.
    pub content: String,
}

impl<'a> SendRequest<'a> {
    /// Builds the request body for `message`.
    #[must_use]
    pub fn new(key: &'a str, message: &'a Message) -> Self {
        let recipients = message
            .to
            .iter()
            .map(|a| (a, RecipientType::To))
            .chain(message.cc.iter().map(|a| (a, RecipientType::Cc)))
            .chain(message.bcc.iter().map(|a| (a, RecipientType::Bcc)))
            .map(|(email, kind)| Recipient { email, kind })
            .collect();

        let mut headers = BTreeMap::new();
        if !message.reply_to.is_empty() {
            headers.insert("Reply-To", message.reply_to.as_str());
        }
        headers.extend(message.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let (images, attachments): (Vec<_>, Vec<_>) =
            message.attachments.iter().partition(|a| a.inline);
        let encode = |a: &'a mailgate_core::Attachment, name: &'a str| FilePayload {
            content_type: a.content_type.as_deref().filter(|t| !t.is_empty()),
            name,
            content: base64::engine::general_purpose::STANDARD.encode(&a.content),
        };

        Self {
            key,
            message: MessagePayload {
                subject: &message.subject,
                from_email: &message.from,
                from_name: non_empty(&message.from_name),
                html: non_empty(&message.body_html),
                text: non_empty(&message.body_text),
                to: recipients,
                headers,
                attachments: attachments
                    .into_iter()
                    .map(|a| encode(a, &a.filename))
                    .collect(),
                images: images
                    .into_iter()
                    .map(|a| encode(a, a.reference_name()))
                    .collect(),
            },
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Per-recipient delivery record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendStatus {
    /// Provider message ID.
    #[serde(rename = "_id")]
    pub id: String,
    /// Recipient address.
    pub email: String,
    /// `sent`, `queued`, `scheduled`, `rejected` or `invalid`.
    pub status: String,
    /// Reason for a rejection.
    pub reject_reason: Option<String>,
}

/// Error object returned instead of the status array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    /// Always `error`.
    pub status: String,
    /// Numeric error code.
    pub code: i64,
    /// Error name.
    pub name: String,
    /// Human-readable description.
    pub message: String,
}

/// Outcome of a send request as reported by the first status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The provider accepted the message.
    Accepted(SendResult),
    /// The provider refused the message; carries the reason.
    Rejected(SendResult, String),
}

/// Parses a `messages/send.json` response body.
///
/// Only the first status record is considered.
///
/// # Errors
///
/// Returns [`Error::Api`] for an error object, [`Error::EmptyResponse`] for an
/// empty array and [`Error::Decode`] when the body matches neither shape.
pub fn parse_response(status: u16, body: &[u8]) -> Result<Delivery> {
    let statuses: Vec<SendStatus> = match serde_json::from_slice(body) {
        Ok(statuses) => statuses,
        Err(source) => {
            return match serde_json::from_slice::<ErrorResponse>(body) {
                Ok(err) if err.status == "error" => Err(Error::api(err.name, err.message)),
                _ => Err(Error::Decode { status, source }),
            };
        }
    };

    let first = statuses.into_iter().next().ok_or(Error::EmptyResponse)?;
    let success = ACCEPTED.contains(&first.status.as_str());
    let reason = first
        .reject_reason
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| first.status.clone());
    let result = SendResult::new(first.id, first.status, success);

    Ok(if success {
        Delivery::Accepted(result)
    } else {
        Delivery::Rejected(result, reason)
    })
}
