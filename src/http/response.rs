//! HTTP/1.1 responses and their wire format.
//!
//! Every response carries a fixed header block: `Content-Type`,
//! `Content-Length`, `Connection: close`, and permissive CORS headers.

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use super::StatusCode;

/// Content type used for every JSON body.
pub const APPLICATION_JSON: &str = "application/json";

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// A response, ready to be serialized and sent.
///
/// # Examples
///
/// ```
/// use userbox::http::{Response, StatusCode};
///
/// let response = Response::text(StatusCode::Ok, "application/json", r#"{"count":2}"#);
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Length: 11\r\n"));
/// assert!(text.ends_with("\r\n\r\n{\"count\":2}"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

impl Response {
    /// Creates a response with a string body.
    pub fn text(
        status: StatusCode,
        content_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into().into_bytes(),
        }
    }

    /// Serializes `value` as compact JSON.
    ///
    /// A serialization failure is logged and turned into a `500` so that a
    /// handler can never take the connection down.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: APPLICATION_JSON.to_owned(),
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::error(StatusCode::InternalServerError, "internal error")
            }
        }
    }

    /// Creates a `{"error": message}` response.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::to_vec(&ErrorBody { error: message })
            .unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec());
        Self {
            status,
            content_type: APPLICATION_JSON.to_owned(),
            body,
        }
    }

    /// The canonical `404` answer for unknown routes.
    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound, "404 Not Found")
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the content type of this response.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serializes the response into a `BytesMut` buffer using HTTP/1.1 wire format.
    pub fn into_bytes(self) -> BytesMut {
        let content_length = self.body.len();
        let mut buf = BytesMut::with_capacity(256 + content_length);

        buf.put(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason()
            )
            .as_bytes(),
        );
        buf.put(format!("Content-Type: {}\r\n", self.content_type).as_bytes());
        buf.put(format!("Content-Length: {content_length}\r\n").as_bytes());
        buf.put(&b"Connection: close\r\n"[..]);
        for (name, value) in CORS_HEADERS {
            buf.put(format!("{name}: {value}\r\n").as_bytes());
        }
        buf.put(&b"\r\n"[..]);
        buf.put(self.body.as_slice());

        buf
    }
}
