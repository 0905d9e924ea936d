//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from its lines.
///
/// Replies are single-line (`250 OK`) or multi-line
/// (`250-First`, `250-Second`, `250 Last`). Every line must carry the same code.
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let first = lines
        .first()
        .ok_or_else(|| Error::Protocol("Empty reply".into()))?;

    let code = parse_code(first)?;
    let mut message = Vec::with_capacity(lines.len());

    for line in lines {
        if parse_code(line)? != code {
            return Err(Error::Protocol(format!("Mixed reply codes: {line}")));
        }
        match line.len() {
            3 => message.push(String::new()),
            _ if matches!(line.as_bytes()[3], b' ' | b'-') => message.push(line[4..].to_string()),
            _ => return Err(Error::Protocol(format!("Malformed reply line: {line}"))),
        }
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

fn parse_code(line: &str) -> Result<u16> {
    let code = line
        .get(..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {line}")))?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("Invalid reply code: {code}")));
    }
    code.parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code}")))
}

/// Checks if a line is the last line of a reply.
///
/// Continuation lines use `-` after the code; the last line uses a space or
/// ends right after the code.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] != b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_single_line_reply() {
        let reply = parse_reply(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_parse_ehlo_reply() {
        let reply = parse_reply(&lines(&[
            "250-mx.example.com greets you",
            "250-STARTTLS",
            "250 AUTH PLAIN LOGIN",
        ]))
        .unwrap();
        assert_eq!(
            reply.message,
            vec!["mx.example.com greets you", "STARTTLS", "AUTH PLAIN LOGIN"]
        );
    }

    #[test]
    fn test_parse_bare_code() {
        let reply = parse_reply(&lines(&["354"])).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.message, vec![""]);
    }

    #[test]
    fn test_is_last_reply_line() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("250"));
        assert!(!is_last_reply_line("250-Continuing"));
        assert!(!is_last_reply_line("25"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&lines(&["25"])).is_err());
        assert!(parse_reply(&lines(&["ABC OK"])).is_err());
        assert!(parse_reply(&lines(&["+25 OK"])).is_err());
        assert!(parse_reply(&lines(&["250XOK"])).is_err());
        assert!(parse_reply(&lines(&["250-a", "550 b"])).is_err());
    }
}
