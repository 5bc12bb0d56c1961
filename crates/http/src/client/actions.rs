//! Action builders: the entry points tests use on a client endpoint.

use super::ClientEndpoint;
use crate::error::HttpError;
use crate::exchange::ReceivedResponse;
use crate::message::{RequestMessage, ResponseMessage};
use crate::validation::PayloadType;

/// Configures and runs a send action on a client endpoint.
#[derive(Debug)]
pub struct SendAction<'a> {
    endpoint: &'a ClientEndpoint,
}

impl<'a> SendAction<'a> {
    pub(super) fn new(endpoint: &'a ClientEndpoint) -> Self {
        Self { endpoint }
    }

    /// Sends the request, returning any synchronous validation error.
    ///
    /// # Errors
    ///
    /// Fails when the message is missing a method or a usable URL; the
    /// physical call has not been started in that case.
    pub async fn message(self, message: &RequestMessage) -> Result<(), HttpError> {
        self.endpoint.do_send(message).await
    }

    /// Like [`SendAction::message`], but fails the test immediately on error.
    ///
    /// # Panics
    ///
    /// Panics with the endpoint-prefixed error when sending fails.
    #[allow(clippy::panic)]
    pub async fn expect_message(self, message: &RequestMessage) {
        if let Err(err) = self.endpoint.do_send(message).await {
            panic!("{err}");
        }
    }
}

/// Configures and runs a receive action on a client endpoint.
#[derive(Debug)]
pub struct ReceiveAction<'a> {
    endpoint: &'a ClientEndpoint,
    payload_type: PayloadType,
}

impl<'a> ReceiveAction<'a> {
    pub(super) fn new(endpoint: &'a ClientEndpoint) -> Self {
        Self {
            endpoint,
            payload_type: PayloadType::Plaintext,
        }
    }

    /// Compares the payload structurally as JSON instead of as plain text.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.payload_type = PayloadType::Json;
        self
    }

    /// Blocks until the background call's outcome is available, then
    /// validates it against `expected`.
    ///
    /// # Errors
    ///
    /// Fails on timeout, on a transport error from the background call, or
    /// with every validation mismatch aggregated.
    pub async fn message(self, expected: &ResponseMessage) -> Result<ReceivedResponse, HttpError> {
        self.endpoint.do_receive(expected, self.payload_type).await
    }

    /// Like [`ReceiveAction::message`], but fails the test immediately on error.
    ///
    /// # Panics
    ///
    /// Panics with the endpoint-prefixed error when receiving or validation
    /// fails.
    #[allow(clippy::panic)]
    pub async fn expect_message(self, expected: &ResponseMessage) -> ReceivedResponse {
        match self.endpoint.do_receive(expected, self.payload_type).await {
            Ok(response) => response,
            Err(err) => panic!("{err}"),
        }
    }
}
