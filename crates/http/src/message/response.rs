//! Response message type.

use std::fmt;

use super::{headers, Message};

/// An outbound response (server side) or an expected response (client side).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMessage {
    /// Headers and payload.
    pub message: Message,
    /// HTTP status code. Validated to be within 100..=999 at send time.
    pub status: u16,
}

impl ResponseMessage {
    /// Creates a response with the given status code.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.message.set_header(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn with_content_type(self, value: impl Into<String>) -> Self {
        self.with_header(headers::CONTENT_TYPE, value)
    }

    /// Sets the `ETag` header.
    #[must_use]
    pub fn with_etag(self, value: impl Into<String>) -> Self {
        self.with_header(headers::ETAG, value)
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.message.payload = payload.into();
        self
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.message.payload
    }
}

impl fmt::Display for ResponseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == 0 {
            write!(f, "[StatusCode: none, ")?;
        } else {
            write!(f, "[StatusCode: {}, ", self.status)?;
        }
        self.message.describe(f)?;
        write!(f, "]")
    }
}
