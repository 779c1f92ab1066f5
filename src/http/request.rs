//! Permissive HTTP/1.1 request parsing.
//!
//! The parser is deliberately narrow: it reads the first two tokens of the
//! request line, looks up `Content-Length` and `Content-Type` by substring
//! search in the header section, and slices the body after the blank line.
//! It does not validate the HTTP version, header syntax, or line endings.
//!
//! Every field is bounded. Where a bound is exceeded the parser fails with a
//! [`ParseError`] instead of reading past the data it was given.

use std::borrow::Cow;
use std::str;

use bytes::Bytes;
use thiserror::Error;

use super::Method;

/// Longest accepted method token.
pub const MAX_METHOD_LEN: usize = 7;

/// Longest accepted request path.
pub const MAX_PATH_LEN: usize = 255;

/// Content types longer than this are truncated, not rejected.
pub const MAX_CONTENT_TYPE_LEN: usize = 127;

/// Largest request body the parser will copy.
pub const MAX_BODY_LEN: usize = 2047;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &[u8] = b"Content-Length:";
const CONTENT_TYPE: &[u8] = b"Content-Type:";

/// Errors that can occur while parsing a raw request buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("{field} exceeds {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("declared body of {declared} bytes exceeds the {max} byte limit")]
    BodyOverflow { declared: usize, max: usize },

    #[error("declared body of {declared} bytes but only {available} received")]
    TruncatedBody { declared: usize, available: usize },
}

impl ParseError {
    /// Returns `true` when more input could turn this error into a successful parse.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::TruncatedBody { .. })
    }
}

/// A request as seen by the router.
///
/// Created by [`ParsedRequest::parse`] and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use userbox::http::{Method, ParsedRequest};
///
/// let raw = b"POST /add HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 13\r\n\r\n{\"newuser\":5}";
/// let request = ParsedRequest::parse(raw).unwrap();
///
/// assert_eq!(request.method(), &Method::Post);
/// assert_eq!(request.path(), "/add");
/// assert_eq!(request.content_length(), 13);
/// assert_eq!(request.content_type(), "application/json");
/// assert_eq!(request.body_text(), "{\"newuser\":5}");
/// ```
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    method: Method,
    path: String,
    content_length: usize,
    content_type: String,
    body: Bytes,
}

impl ParsedRequest {
    /// Parse one request from a byte buffer believed to hold all of it.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MalformedRequestLine`] if the first line has fewer than
    ///   two whitespace-separated tokens, or they are not UTF-8.
    /// - [`ParseError::FieldTooLong`] if the method or path exceed their bounds.
    /// - [`ParseError::BodyOverflow`] if the declared body is larger than
    ///   [`MAX_BODY_LEN`].
    /// - [`ParseError::TruncatedBody`] if fewer body bytes are present than declared.
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let line_end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
        let mut tokens = buf[..line_end]
            .split(u8::is_ascii_whitespace)
            .filter(|token| !token.is_empty());

        let (Some(method), Some(path)) = (tokens.next(), tokens.next()) else {
            return Err(ParseError::MalformedRequestLine);
        };
        let method = str::from_utf8(method).map_err(|_| ParseError::MalformedRequestLine)?;
        let path = str::from_utf8(path).map_err(|_| ParseError::MalformedRequestLine)?;

        if method.len() > MAX_METHOD_LEN {
            return Err(ParseError::FieldTooLong {
                field: "method",
                max: MAX_METHOD_LEN,
            });
        }
        if path.len() > MAX_PATH_LEN {
            return Err(ParseError::FieldTooLong {
                field: "path",
                max: MAX_PATH_LEN,
            });
        }

        let (head, body_start) = match header_end(buf) {
            Some(end) => (&buf[..end], Some(end + HEADER_TERMINATOR.len())),
            None => (buf, None),
        };

        let content_length = match header_value(head, CONTENT_LENGTH) {
            Some(value) => parse_length(value)?,
            None => 0,
        };
        let content_type = header_value(head, CONTENT_TYPE)
            .map(bounded_content_type)
            .unwrap_or_default();

        let body = if content_length == 0 {
            Bytes::new()
        } else {
            if content_length > MAX_BODY_LEN {
                return Err(ParseError::BodyOverflow {
                    declared: content_length,
                    max: MAX_BODY_LEN,
                });
            }
            let start = body_start.unwrap_or(buf.len());
            let available = buf.len() - start;
            if available < content_length {
                return Err(ParseError::TruncatedBody {
                    declared: content_length,
                    available,
                });
            }
            Bytes::copy_from_slice(&buf[start..start + content_length])
        };

        Ok(Self {
            method: method.parse().unwrap_or_else(|never| match never {}),
            path: path.to_owned(),
            content_length,
            content_type,
            body,
        })
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request target exactly as sent.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the declared `Content-Length`, or 0.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Returns the `Content-Type` value, or an empty string.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the body bytes; never longer than [`content_length`](Self::content_length).
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Returns the offset of the `\r\n\r\n` separator, if the buffer contains one.
pub(crate) fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

// Finds `name` anywhere in `head` (ASCII case-insensitive) and returns the
// rest of that line with leading blanks skipped.
fn header_value<'a>(head: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    let pos = head
        .windows(name.len())
        .position(|window| window.eq_ignore_ascii_case(name))?;
    let rest = &head[pos + name.len()..];
    let start = rest
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(rest.len());
    let rest = &rest[start..];
    let end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

// Leading decimal digits, `atoi` style. Anything unparsable counts as 0.
fn parse_length(value: &[u8]) -> Result<usize, ParseError> {
    value
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .try_fold(0usize, |acc, &digit| {
            acc.checked_mul(10)?.checked_add(usize::from(digit - b'0'))
        })
        .ok_or(ParseError::BodyOverflow {
            declared: usize::MAX,
            max: MAX_BODY_LEN,
        })
}

fn bounded_content_type(value: &[u8]) -> String {
    let text = String::from_utf8_lossy(value);
    let mut end = text.len().min(MAX_CONTENT_TYPE_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET /count HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/count");
        assert_eq!(req.content_length(), 0);
        assert_eq!(req.content_type(), "");
        assert!(req.body().is_empty());
    }

    #[test]
    fn method_and_path_are_first_two_tokens() {
        let raw = b"POST   /add\tHTTP/1.1 trailing junk\r\n\r\n";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Post);
        assert_eq!(req.path(), "/add");
    }

    #[test]
    fn version_is_not_required() {
        let req = ParsedRequest::parse(b"GET /news").unwrap();
        assert_eq!(req.path(), "/news");
    }

    #[test]
    fn single_token_is_malformed() {
        assert_eq!(
            ParsedRequest::parse(b"GET\r\nHost: x\r\n\r\n").unwrap_err(),
            ParseError::MalformedRequestLine
        );
        assert_eq!(
            ParsedRequest::parse(b"").unwrap_err(),
            ParseError::MalformedRequestLine
        );
    }

    #[test]
    fn path_on_second_line_is_malformed() {
        let err = ParsedRequest::parse(b"GET\n/count HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err, ParseError::MalformedRequestLine);
    }

    #[test]
    fn overlong_method_is_rejected() {
        let err = ParsedRequest::parse(b"PROPFIND / HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldTooLong {
                field: "method",
                max: MAX_METHOD_LEN
            }
        );
    }

    #[test]
    fn overlong_path_is_rejected() {
        let raw = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_PATH_LEN));
        let err = ParsedRequest::parse(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::FieldTooLong { field: "path", .. }));

        let raw = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_PATH_LEN - 1));
        assert!(ParsedRequest::parse(raw.as_bytes()).is_ok());
    }

    #[test]
    fn body_is_exactly_content_length() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello world";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.content_length(), 5);
        assert_eq!(&req.body()[..], b"hello");
    }

    #[test]
    fn content_length_lookup_ignores_case_and_blanks() {
        let raw = b"POST /add HTTP/1.1\r\ncontent-length:\t 3\r\n\r\nabc";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.content_length(), 3);
        assert_eq!(&req.body()[..], b"abc");
    }

    #[test]
    fn non_numeric_content_length_is_zero() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Length: abc\r\n\r\n{\"newuser\":1}";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.content_length(), 0);
        assert!(req.body().is_empty());

        let raw = b"POST /add HTTP/1.1\r\nContent-Length: -4\r\n\r\nabcd";
        assert_eq!(ParsedRequest::parse(raw).unwrap().content_length(), 0);
    }

    #[test]
    fn headers_in_body_are_ignored() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Length: 34\r\n\r\nContent-Type: x\r\nContent-Length: 9";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.content_length(), 34);
        assert_eq!(req.content_type(), "");
    }

    #[test]
    fn content_type_is_captured_to_end_of_line() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Type:   application/json; charset=utf-8\r\n\r\n";
        let req = ParsedRequest::parse(raw).unwrap();
        assert_eq!(req.content_type(), "application/json; charset=utf-8");
    }

    #[test]
    fn content_type_is_truncated() {
        let long = "x".repeat(MAX_CONTENT_TYPE_LEN + 40);
        let raw = format!("GET / HTTP/1.1\r\nContent-Type: {long}\r\n\r\n");
        let req = ParsedRequest::parse(raw.as_bytes()).unwrap();
        assert_eq!(req.content_type().len(), MAX_CONTENT_TYPE_LEN);
    }

    #[test]
    fn oversized_body_is_rejected() {
        let raw = format!(
            "POST /add HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
            MAX_BODY_LEN + 1
        );
        let err = ParsedRequest::parse(raw.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ParseError::BodyOverflow {
                declared: MAX_BODY_LEN + 1,
                max: MAX_BODY_LEN
            }
        );
        assert!(!err.is_incomplete());
    }

    #[test]
    fn absurd_content_length_is_overflow() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Length: 99999999999999999999999999\r\n\r\n";
        let err = ParsedRequest::parse(raw).unwrap_err();
        assert!(matches!(err, ParseError::BodyOverflow { .. }));
    }

    #[test]
    fn short_body_is_truncated() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let err = ParsedRequest::parse(raw).unwrap_err();
        assert_eq!(
            err,
            ParseError::TruncatedBody {
                declared: 10,
                available: 3
            }
        );
        assert!(err.is_incomplete());
    }

    #[test]
    fn missing_separator_with_length_is_truncated() {
        let raw = b"POST /add HTTP/1.1\r\nContent-Length: 2\r\n";
        let err = ParsedRequest::parse(raw).unwrap_err();
        assert_eq!(
            err,
            ParseError::TruncatedBody {
                declared: 2,
                available: 0
            }
        );
    }

    #[test]
    fn header_end_finds_separator() {
        assert_eq!(header_end(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
        assert_eq!(header_end(b"GET / HTTP/1.1\r\n"), None);
    }
}
