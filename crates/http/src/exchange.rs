//! Captured wire-level exchanges.
//!
//! The platform request/response objects are consumed when their bodies are
//! read, so the endpoints capture them into these owned snapshots. The
//! snapshot is what the validation engine inspects and what a successful
//! `receive` hands back to the test.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::util;

/// A request as it arrived at a server endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path, as sent on the wire.
    pub path: String,
    /// Decoded query parameters, values in wire order per key.
    pub query_params: HashMap<String, Vec<String>>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Bytes,
}

impl ReceivedRequest {
    pub(crate) async fn capture(request: axum::extract::Request) -> Result<Self, axum::Error> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await?;
        let query_params = parts.uri.query().map(util::parse_query).unwrap_or_default();

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query_params,
            headers: parts.headers,
            body,
        })
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A response as it came back to a client endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Bytes,
}

impl ReceivedResponse {
    pub(crate) async fn capture(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
