//! Minimal HTTP/1.1 request decoder and response encoder.
//!
//! Only what the gateway API needs: a request line, headers, and an
//! optional `Content-Length` body.  One request per connection; the
//! response always carries `Connection: close`.
//!
//! The decoder accumulates incoming bytes and yields a complete request
//! once the head and the declared body have arrived, so a single socket
//! read may carry part of the head, part of the body, or all of it.

use serde_json::Value;

use super::{ApiRequest, Method};

/// Upper bound on head + body.
pub const MAX_REQUEST_SIZE: usize = 16 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Request line or headers could not be parsed.
    Malformed(&'static str),
    /// Head or declared body exceeds [`MAX_REQUEST_SIZE`].
    TooLarge,
    /// Chunked or otherwise framed bodies.
    Unsupported(&'static str),
}

impl HttpError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Malformed(_) => 400,
            Self::TooLarge => 413,
            Self::Unsupported(_) => 501,
        }
    }
}

impl core::fmt::Display for HttpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed(what) => write!(f, "malformed request: {}", what),
            Self::TooLarge => write!(f, "request exceeds {} bytes", MAX_REQUEST_SIZE),
            Self::Unsupported(what) => write!(f, "unsupported: {}", what),
        }
    }
}

impl std::error::Error for HttpError {}

enum DecoderState {
    /// Waiting for the blank line that ends the head.
    ReadingHead,
    /// Head parsed, waiting for `expected` body bytes starting at `body_start`.
    ReadingBody {
        method: Method,
        path: String,
        body_start: usize,
        expected: usize,
    },
}

/// Streaming request decoder.
pub struct RequestDecoder {
    state: DecoderState,
    buf: Vec<u8>,
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::ReadingHead,
            buf: Vec::with_capacity(1024),
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Returns `Ok(Some(request))` once a full request is available.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<ApiRequest>, HttpError> {
        if self.buf.len() + data.len() > MAX_REQUEST_SIZE {
            return Err(HttpError::TooLarge);
        }
        self.buf.extend_from_slice(data);

        if let DecoderState::ReadingHead = self.state {
            let Some(end) = find(&self.buf, HEAD_TERMINATOR) else {
                return Ok(None);
            };
            let head = core::str::from_utf8(&self.buf[..end])
                .map_err(|_| HttpError::Malformed("head is not UTF-8"))?;
            let (method, path, expected) = parse_head(head)?;
            let body_start = end + HEAD_TERMINATOR.len();
            if body_start
                .checked_add(expected)
                .is_none_or(|total| total > MAX_REQUEST_SIZE)
            {
                return Err(HttpError::TooLarge);
            }
            self.state = DecoderState::ReadingBody {
                method,
                path,
                body_start,
                expected,
            };
        }

        let DecoderState::ReadingBody {
            body_start,
            expected,
            ..
        } = self.state
        else {
            return Ok(None);
        };
        if self.buf.len() < body_start + expected {
            return Ok(None);
        }

        let state = core::mem::replace(&mut self.state, DecoderState::ReadingHead);
        let DecoderState::ReadingBody { method, path, .. } = state else {
            return Ok(None);
        };
        let body = self.buf[body_start..body_start + expected].to_vec();
        self.buf.clear();
        Ok(Some(ApiRequest { method, path, body }))
    }

}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_head(head: &str) -> Result<(Method, String, usize), HttpError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or(HttpError::Malformed("empty head"))?;

    let mut parts = request_line.split(' ');
    let method = parts
        .next()
        .filter(|m| !m.is_empty())
        .ok_or(HttpError::Malformed("missing method"))?;
    let target = parts
        .next()
        .filter(|t| t.starts_with('/'))
        .ok_or(HttpError::Malformed("missing request target"))?;
    match parts.next() {
        Some(v) if v.starts_with("HTTP/1.") => {}
        _ => return Err(HttpError::Malformed("bad protocol version")),
    }

    let mut content_length = 0usize;
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or(HttpError::Malformed("header without colon"))?;
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value
                .parse()
                .map_err(|_| HttpError::Malformed("bad Content-Length"))?;
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            return Err(HttpError::Unsupported("Transfer-Encoding"));
        }
    }

    Ok((Method::from_token(method), target.to_string(), content_length))
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Render a JSON response.
pub fn encode_response(status: u16, body: &Value) -> Vec<u8> {
    let body = body.to_string();
    let mut out = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\r\n",
        status,
        reason_phrase(status),
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}
