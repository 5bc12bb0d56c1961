//! Message model: value objects describing expected and outbound HTTP messages.
//!
//! Messages are plain data. A test constructs one, hands it to an endpoint
//! action, and can reuse the same value across assertions - endpoints always
//! clone before applying their own defaults.

mod request;
mod response;

pub use request::{HttpMethod, RequestMessage};
pub use response::ResponseMessage;

use std::collections::HashMap;
use std::fmt;

/// Well-known header names and values used by the convenience setters.
pub mod headers {
    /// `Content-Type` header name.
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// `Authorization` header name.
    pub const AUTHORIZATION: &str = "Authorization";
    /// `ETag` header name.
    pub const ETAG: &str = "ETag";
    /// JSON content type value.
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// The part shared by request and response messages: headers and payload.
///
/// Header names are stored as given; comparison against actual traffic is
/// case-insensitive (see [`crate::validation`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Header name to header value.
    pub headers: HashMap<String, String>,
    /// Opaque payload. Empty means "no payload" / "no expectation".
    pub payload: String,
}

impl Message {
    /// Returns the value of `name`, matching the stored name exactly.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub(crate) fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Applies `content_type` when the message does not carry one already.
    pub(crate) fn default_content_type(&mut self, content_type: &str) {
        if content_type.is_empty() {
            return;
        }
        let missing = match self.headers.get(headers::CONTENT_TYPE) {
            Some(value) => value.is_empty(),
            None => true,
        };
        if missing {
            self.set_header(headers::CONTENT_TYPE, content_type);
        }
    }

    pub(crate) fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Headers: {:?}, Payload: {}", self.headers, self.payload)
    }
}
