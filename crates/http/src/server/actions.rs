//! Action builders: the entry points tests use on a server endpoint.

use super::ServerEndpoint;
use crate::error::HttpError;
use crate::exchange::ReceivedRequest;
use crate::message::{RequestMessage, ResponseMessage};
use crate::validation::PayloadType;

/// Configures and runs a receive action on a server endpoint.
#[derive(Debug)]
pub struct ReceiveAction<'a> {
    endpoint: &'a ServerEndpoint,
    payload_type: PayloadType,
}

impl<'a> ReceiveAction<'a> {
    pub(super) fn new(endpoint: &'a ServerEndpoint) -> Self {
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

    /// Blocks until a request arrives, then validates it against `expected`.
    ///
    /// # Errors
    ///
    /// Fails on timeout or with every validation mismatch aggregated.
    pub async fn message(self, expected: &RequestMessage) -> Result<ReceivedRequest, HttpError> {
        self.endpoint.do_receive(expected, self.payload_type).await
    }

    /// Like [`ReceiveAction::message`], but fails the test immediately on error.
    ///
    /// # Panics
    ///
    /// Panics with the endpoint-prefixed error when receiving or validation
    /// fails.
    #[allow(clippy::panic)]
    pub async fn expect_message(self, expected: &RequestMessage) -> ReceivedRequest {
        match self.endpoint.do_receive(expected, self.payload_type).await {
            Ok(request) => request,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Configures and runs a send action on a server endpoint.
#[derive(Debug)]
pub struct SendAction<'a> {
    endpoint: &'a ServerEndpoint,
}

impl<'a> SendAction<'a> {
    pub(super) fn new(endpoint: &'a ServerEndpoint) -> Self {
        Self { endpoint }
    }

    /// Hands the response to the request handler blocked on this endpoint.
    ///
    /// An invalid message (status outside 100..=999) still signals the
    /// handler - it writes a default 500 so the exchange completes - and the
    /// validation error is returned here.
    ///
    /// # Errors
    ///
    /// Fails on an invalid status code or when no handler picked the
    /// response up within the action-timeout.
    pub async fn message(self, message: &ResponseMessage) -> Result<(), HttpError> {
        self.endpoint.do_send(message).await
    }

    /// Like [`SendAction::message`], but fails the test immediately on error.
    ///
    /// # Panics
    ///
    /// Panics with the endpoint-prefixed error when sending fails.
    #[allow(clippy::panic)]
    pub async fn expect_message(self, message: &ResponseMessage) {
        if let Err(err) = self.endpoint.do_send(message).await {
            panic!("{err}");
        }
    }
}
