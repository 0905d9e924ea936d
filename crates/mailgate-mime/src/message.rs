//! MIME message structure and rendering.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_rfc2231, needs_encoding};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII, written as-is.
    SevenBit,
    /// Base64 encoding wrapped at 76 columns.
    Base64,
}

impl TransferEncoding {
    /// Encodes `data` for transport.
    #[must_use]
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::SevenBit => String::from_utf8_lossy(data).into_owned(),
            Self::Base64 => encode_base64_wrapped(data),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// How an attachment is presented to the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Offered as a downloadable file.
    Attachment,
    /// Rendered in the body and referenced as `cid:<content_id>`.
    Inline {
        /// Content identifier, without angle brackets.
        content_id: String,
    },
}

/// File attached to a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Content type of the file.
    pub content_type: ContentType,
    /// Raw file content.
    pub content: Vec<u8>,
    /// Presentation.
    pub disposition: Disposition,
}

impl Attachment {
    /// Creates a regular attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: ContentType, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            content,
            disposition: Disposition::Attachment,
        }
    }

    /// Creates an inline attachment referenced by `content_id`.
    #[must_use]
    pub fn inline(
        content_id: impl Into<String>,
        filename: impl Into<String>,
        content_type: ContentType,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            content,
            disposition: Disposition::Inline {
                content_id: content_id.into(),
            },
        }
    }

    /// Converts the attachment into a base64-encoded body part.
    ///
    /// # Errors
    ///
    /// Returns an error if the content id would produce an invalid header.
    pub fn into_part(self) -> Result<Part> {
        let (name_param, filename) = if needs_encoding(&self.filename) {
            let encoded = encode_rfc2231(&self.filename);
            (("name*", encoded.clone()), format!("filename*={encoded}"))
        } else {
            (
                ("name", self.filename.clone()),
                format!("filename={}", quote_parameter(&self.filename)),
            )
        };
        let mut headers = Headers::new();
        headers.add(
            "Content-Type",
            self.content_type.with_parameter(name_param.0, name_param.1).to_string(),
        )?;
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string())?;
        match self.disposition {
            Disposition::Attachment => {
                headers.add("Content-Disposition", format!("attachment; {filename}"))?;
            }
            Disposition::Inline { content_id } => {
                headers.add("Content-Disposition", format!("inline; {filename}"))?;
                headers.add("Content-ID", format!("<{content_id}>"))?;
            }
        }

        Ok(Part {
            headers,
            body: Body::Encoded(TransferEncoding::Base64.encode(&self.content)),
        })
    }
}

fn quote_parameter(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Body of a MIME part.
#[derive(Debug, Clone)]
pub enum Body {
    /// Content already transfer-encoded.
    Encoded(String),
    /// Nested parts separated by `boundary`.
    Multipart {
        /// Boundary delimiter, also present in the part's Content-Type.
        boundary: String,
        /// Child parts in order.
        parts: Vec<Part>,
    },
}

/// MIME message part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body.
    pub body: Body,
}

impl Part {
    /// Creates a leaf part with the given content type and transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type renders to an invalid header.
    pub fn leaf(content_type: &ContentType, encoding: TransferEncoding, data: &[u8]) -> Result<Self> {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string())?;
        headers.add("Content-Transfer-Encoding", encoding.to_string())?;
        Ok(Self {
            headers,
            body: Body::Encoded(encoding.encode(data)),
        })
    }

    /// Creates a base64 `text/plain; charset=UTF-8` part.
    ///
    /// # Errors
    ///
    /// See [`Part::leaf`].
    pub fn text(text: &str) -> Result<Self> {
        Self::leaf(&ContentType::text_plain(), TransferEncoding::Base64, text.as_bytes())
    }

    /// Creates a base64 `text/html; charset=UTF-8` part.
    ///
    /// # Errors
    ///
    /// See [`Part::leaf`].
    pub fn html(html: &str) -> Result<Self> {
        Self::leaf(&ContentType::text_html(), TransferEncoding::Base64, html.as_bytes())
    }

    /// Creates a multipart container. `content_type` must carry the boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type has no boundary parameter.
    pub fn multipart(content_type: &ContentType, parts: Vec<Self>) -> Result<Self> {
        let boundary = content_type
            .boundary()
            .ok_or_else(|| {
                Error::InvalidContentType(format!("{} has no boundary", content_type.essence()))
            })?
            .to_string();
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string())?;
        Ok(Self {
            headers,
            body: Body::Multipart { boundary, parts },
        })
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("Content-Type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Returns the child parts of a multipart body.
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match &self.body {
            Body::Multipart { parts, .. } => parts,
            Body::Encoded(_) => &[],
        }
    }

    fn write_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Body::Encoded(content) => write!(f, "{content}\r\n"),
            Body::Multipart { boundary, parts } => {
                for part in parts {
                    write!(f, "--{boundary}\r\n{part}")?;
                }
                write!(f, "--{boundary}--\r\n")
            }
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.headers)?;
        self.write_body(f)
    }
}

/// Complete MIME message: top-level headers plus a root body part.
#[derive(Debug, Clone)]
pub struct Message {
    /// Envelope-visible headers (From, To, Subject, ...).
    pub headers: Headers,
    /// Root part; its headers follow `MIME-Version`.
    pub body: Part,
}

impl Message {
    /// Gets a top-level header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Gets the root content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.body.content_type()
    }

    /// Renders the message as CRLF-terminated bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}MIME-Version: 1.0\r\n{}", self.headers, self.body)
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
    use crate::encoding::decode_base64;

    #[test]
    fn test_text_part() {
        let part = Part::text("Hello, World!").unwrap();
        assert_eq!(
            part.to_string(),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             SGVsbG8sIFdvcmxkIQ==\r\n"
        );
    }

    #[test]
    fn test_multipart_rendering() {
        let ct = ContentType::multipart_alternative("b1");
        let part = Part::multipart(&ct, vec![Part::text("a").unwrap(), Part::html("<b>a</b>").unwrap()]).unwrap();
        let rendered = part.to_string();

        assert!(rendered.starts_with("Content-Type: multipart/alternative; boundary=b1\r\n\r\n--b1\r\n"));
        assert!(rendered.ends_with("--b1--\r\n"));
        assert_eq!(rendered.matches("--b1\r\n").count(), 2);
        assert_eq!(part.parts().len(), 2);
        assert_eq!(part.parts()[1].content_type().unwrap().essence(), "text/html");
    }

    #[test]
    fn test_multipart_requires_boundary() {
        let ct = ContentType::new("multipart", "mixed");
        assert!(Part::multipart(&ct, Vec::new()).is_err());
    }

    #[test]
    fn test_attachment_part() {
        let attachment = Attachment::new(
            "report.pdf",
            ContentType::new("application", "pdf"),
            b"%PDF".to_vec(),
        );
        let part = attachment.into_part().unwrap();

        assert_eq!(part.headers.get("Content-Type"), Some("application/pdf; name=report.pdf"));
        assert_eq!(
            part.headers.get("Content-Disposition"),
            Some("attachment; filename=\"report.pdf\"")
        );
        assert!(!part.headers.contains("Content-ID"));
        match &part.body {
            Body::Encoded(encoded) => assert_eq!(decode_base64(encoded).unwrap(), b"%PDF"),
            Body::Multipart { .. } => panic!("expected leaf"),
        }
    }

    #[test]
    fn test_inline_attachment_part() {
        let attachment = Attachment::inline(
            "logo",
            "logo.png",
            ContentType::new("image", "png"),
            vec![0x89, 0x50],
        );
        let part = attachment.into_part().unwrap();
        assert_eq!(
            part.headers.get("Content-Disposition"),
            Some("inline; filename=\"logo.png\"")
        );
        assert_eq!(part.headers.get("Content-ID"), Some("<logo>"));
    }

    #[test]
    fn test_non_ascii_filename_uses_extended_parameters() {
        let attachment = Attachment::new(
            "résumé.pdf",
            ContentType::new("application", "pdf"),
            b"%PDF".to_vec(),
        );
        let part = attachment.into_part().unwrap();

        assert_eq!(
            part.headers.get("Content-Type"),
            Some("application/pdf; name*=UTF-8''r%C3%A9sum%C3%A9.pdf")
        );
        assert_eq!(
            part.headers.get("Content-Disposition"),
            Some("attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf")
        );
    }

    #[test]
    fn test_inline_attachment_rejects_bad_content_id() {
        let attachment = Attachment::inline(
            "logo>\r\nBcc: x@example.com",
            "logo.png",
            ContentType::new("image", "png"),
            Vec::new(),
        );
        assert!(attachment.into_part().is_err());
    }
}
