//! Request message type and the HTTP method enumeration.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::{headers, Message};
use crate::error::HttpError;

/// The eight canonical HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// HTTP GET method
    #[default]
    Get,
    /// HTTP HEAD method
    Head,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP PATCH method
    Patch,
    /// HTTP DELETE method
    Delete,
    /// HTTP OPTIONS method
    Options,
    /// HTTP TRACE method
    Trace,
}

impl HttpMethod {
    /// Returns the method as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }

    pub(crate) fn as_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Head => http::Method::HEAD,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Patch => http::Method::PATCH,
            Self::Delete => http::Method::DELETE,
            Self::Options => http::Method::OPTIONS,
            Self::Trace => http::Method::TRACE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, HttpError> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "TRACE" => Ok(Self::Trace),
            other => Err(HttpError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// An outbound request (client side) or an expected request (server side).
///
/// The base URL is normally configured on the client endpoint; setting it on
/// the message lets a single client target different hosts. It has no effect
/// on server-side validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMessage {
    /// Headers and payload.
    pub message: Message,
    /// HTTP method. `None` fails `send` synchronously.
    pub method: Option<HttpMethod>,
    /// Target URL override; empty means "use the endpoint's base URL".
    pub base_url: String,
    /// Path fragment joined with the base URL at send time.
    pub path: String,
    /// Query parameter name to its ordered values.
    pub query_params: HashMap<String, Vec<String>>,
}

impl RequestMessage {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a HEAD request.
    #[must_use]
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Creates an OPTIONS request.
    #[must_use]
    pub fn options(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Options, path)
    }

    /// Creates a TRACE request.
    #[must_use]
    pub fn trace(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Trace, path)
    }

    /// Overrides the target base URL for this message.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the path fragment.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
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

    /// Sets the `Authorization` header.
    #[must_use]
    pub fn with_authorization(self, value: impl Into<String>) -> Self {
        self.with_header(headers::AUTHORIZATION, value)
    }

    /// Sets the `ETag` header.
    #[must_use]
    pub fn with_etag(self, value: impl Into<String>) -> Self {
        self.with_header(headers::ETAG, value)
    }

    /// Appends one value to a query parameter.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Appends several values to a query parameter, keeping their order.
    #[must_use]
    pub fn with_query_param_values<I>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.query_params
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
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

impl fmt::Display for RequestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method.map_or("none", HttpMethod::as_str);
        write!(
            f,
            "[Method: {method}, BaseUrl: {}, Path: '{}', QueryParams: {:?}, ",
            self.base_url, self.path, self.query_params
        )?;
        self.message.describe(f)?;
        write!(f, "]")
    }
}
