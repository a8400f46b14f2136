//! Responses as seen by transports and by callers.

use std::borrow::Cow;

use crate::request::Headers;

/// Status, headers and body exactly as a transport read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Final outcome of one logical request.
///
/// Immutable once built. `success` is computed from the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status_code: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn from_raw(raw: RawResponse) -> Self {
        Self {
            status_code: raw.status,
            headers: raw.headers,
            body: raw.body,
        }
    }

    /// Response returned once the retry or time budget is spent: status and
    /// headers of the last attempt that produced an HTTP response, without
    /// its body. Later attempts that failed without a response (connection
    /// errors, transport timeouts) do not replace it.
    pub(crate) fn exhausted(last: RawResponse) -> Self {
        Self {
            status_code: last.status,
            headers: last.headers,
            body: Vec::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn success(&self) -> bool {
        (200..400).contains(&self.status_code)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
