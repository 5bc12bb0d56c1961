//! Error types returned by endpoint actions.

use thiserror::Error;

use crate::validation::Mismatches;

/// Everything that can go wrong while driving a conversation.
///
/// Construction and usage problems surface synchronously from `send`;
/// transport, timeout and validation failures surface from the paired
/// `receive`. Messages carry the endpoint name so interleaved conversations
/// stay attributable.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The method string does not name one of the eight canonical verbs.
    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod {
        /// The rejected method string.
        method: String,
    },

    /// The request message carries no HTTP method.
    #[error("{endpoint}: message to send is invalid - missing HTTP method")]
    MissingMethod {
        /// Endpoint reporting the failure.
        endpoint: String,
    },

    /// Neither the message nor the endpoint provides a target URL.
    #[error("{endpoint}: message to send is invalid - missing url")]
    MissingUrl {
        /// Endpoint reporting the failure.
        endpoint: String,
    },

    /// The target URL lacks a scheme or a host, or does not parse at all.
    #[error("{endpoint}: message to send is invalid - invalid url [{url}]")]
    InvalidUrl {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// The rejected URL.
        url: String,
    },

    /// The response status code is outside 100..=999.
    #[error("{endpoint}: message to send is invalid - unsupported status code [{status}]")]
    UnsupportedStatusCode {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// The rejected status code.
        status: u16,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("could not create HTTP client - {source}")]
    ClientBuild {
        /// Error from the client library.
        source: reqwest::Error,
    },

    /// The listener socket could not be bound.
    #[error("{endpoint}: could not bind listener - {source}")]
    Bind {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// Error from the socket layer.
        source: std::io::Error,
    },

    /// The physical request could not be assembled from the message.
    #[error("{endpoint}: could not build request - {source}")]
    BuildRequest {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// Error from the client library.
        source: reqwest::Error,
    },

    /// The background call failed at the transport level.
    #[error("{endpoint}: error while receiving response - {source}")]
    Transport {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// The transport error.
        source: reqwest::Error,
    },

    /// No counterpart event arrived within the action-timeout.
    #[error("{endpoint}: receive action timed out - no {subject} received for validation")]
    ReceiveTimeout {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// What was being waited for: "request" or "response".
        subject: &'static str,
    },

    /// No request handler was waiting for the response within the action-timeout.
    #[error("{endpoint}: send action timed out - no request handler waiting for a response")]
    SendTimeout {
        /// Endpoint reporting the failure.
        endpoint: String,
    },

    /// The exchange happened but did not match the expected message.
    #[error("{}", .failures.render_prefixed(.endpoint))]
    Validation {
        /// Endpoint reporting the failure.
        endpoint: String,
        /// Every mismatch found, reported together.
        failures: Mismatches,
    },
}
