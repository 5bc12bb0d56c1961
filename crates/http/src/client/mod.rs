//! Client endpoint: a two-phase send/receive protocol around outbound calls.
//!
//! `send` validates the request synchronously, starts the physical call on a
//! background task and returns immediately. The background task delivers its
//! outcome over the endpoint's rendezvous channel, where the next `receive`
//! picks it up, runs validation and hands the captured response to the test.

mod actions;

pub use actions::{ReceiveAction, SendAction};

use std::sync::Arc;
use std::time::Duration;

use accord_core::{config, ActionTracker, Rendezvous};
use tracing::{debug, error, info};
use url::Url;

use crate::error::HttpError;
use crate::exchange::ReceivedResponse;
use crate::message::{RequestMessage, ResponseMessage};
use crate::util;
use crate::validation::{self, PayloadType};

type ExchangeOutcome = Result<ReceivedResponse, reqwest::Error>;

/// A named, pre-configured handle for driving outbound HTTP calls in a test.
///
/// Build one per suite with [`ClientEndpoint::builder`]. The endpoint owns a
/// reusable HTTP client and a single rendezvous channel pairing each `send`
/// with the following `receive`.
#[derive(Debug)]
pub struct ClientEndpoint {
    name: String,
    base_url: String,
    content_type: String,
    timeout: Duration,
    client: reqwest::Client,
    exchange: Arc<Rendezvous<ExchangeOutcome>>,
    tracker: ActionTracker,
}

impl ClientEndpoint {
    /// Returns a builder for a client endpoint.
    #[must_use]
    pub fn builder() -> ClientEndpointBuilder {
        ClientEndpointBuilder::default()
    }

    /// The endpoint name used to prefix diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tracker counting this endpoint's in-flight background calls.
    #[must_use]
    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    /// Starts a send action.
    #[must_use]
    pub fn send(&self) -> SendAction<'_> {
        SendAction::new(self)
    }

    /// Starts a receive action.
    #[must_use]
    pub fn receive(&self) -> ReceiveAction<'_> {
        ReceiveAction::new(self)
    }

    pub(crate) async fn do_send(&self, message: &RequestMessage) -> Result<(), HttpError> {
        debug!(endpoint = %self.name, %message, "message to send");

        let message_to_send = self.message_to_send(message);
        debug!(endpoint = %self.name, message = %message_to_send, "will send message");

        self.validate_message_to_send(&message_to_send)?;
        let request = self.build_request(&message_to_send)?;

        let endpoint = self.name.clone();
        let client = self.client.clone();
        let exchange = Arc::clone(&self.exchange);
        let timeout = self.timeout;
        let guard = self.tracker.register();

        tokio::spawn(async move {
            let _guard = guard;

            info!(
                endpoint = %endpoint,
                method = %request.method(),
                url = %request.url(),
                "sending HTTP request"
            );

            let outcome = match client.execute(request).await {
                Ok(response) => match ReceivedResponse::capture(response).await {
                    Ok(captured) => {
                        info!(
                            endpoint = %endpoint,
                            status = %captured.status,
                            payload = %captured.body_text(),
                            "received HTTP response"
                        );
                        Ok(captured)
                    }
                    Err(err) => {
                        error!(endpoint = %endpoint, "could not read response body - {err}");
                        Err(err)
                    }
                },
                Err(err) => {
                    error!(endpoint = %endpoint, "error on response - {err}");
                    Err(err)
                }
            };

            if exchange.send_timeout(outcome, timeout).await.is_err() {
                error!(
                    endpoint = %endpoint,
                    "action timed out - no client receive action called in test"
                );
            }
        });

        Ok(())
    }

    pub(crate) async fn do_receive(
        &self,
        expected: &ResponseMessage,
        payload_type: PayloadType,
    ) -> Result<ReceivedResponse, HttpError> {
        debug!(endpoint = %self.name, message = %expected, "message to receive");

        match self.exchange.recv_timeout(self.timeout).await {
            Ok(Ok(response)) => {
                let expected = self.message_to_receive(expected);
                debug!(endpoint = %self.name, message = %expected, "validating message");

                let failures = validation::validate_response(&expected, &response, payload_type);
                if failures.is_empty() {
                    Ok(response)
                } else {
                    Err(self.fail(HttpError::Validation {
                        endpoint: self.name.clone(),
                        failures,
                    }))
                }
            }
            Ok(Err(transport)) => Err(self.fail(HttpError::Transport {
                endpoint: self.name.clone(),
                source: transport,
            })),
            Err(_) => Err(self.fail(HttpError::ReceiveTimeout {
                endpoint: self.name.clone(),
                subject: "response",
            })),
        }
    }

    /// Fills in endpoint defaults on a clone: base URL and content type.
    fn message_to_send(&self, message: &RequestMessage) -> RequestMessage {
        let mut message_to_send = message.clone();

        if message_to_send.base_url.is_empty() {
            message_to_send.base_url.clone_from(&self.base_url);
        }
        message_to_send
            .message
            .default_content_type(&self.content_type);

        message_to_send
    }

    /// Fills in the endpoint content type on a clone of the expectation.
    fn message_to_receive(&self, expected: &ResponseMessage) -> ResponseMessage {
        let mut message_to_receive = expected.clone();
        message_to_receive
            .message
            .default_content_type(&self.content_type);
        message_to_receive
    }

    fn validate_message_to_send(&self, message: &RequestMessage) -> Result<(), HttpError> {
        if message.method.is_none() {
            return Err(self.fail(HttpError::MissingMethod {
                endpoint: self.name.clone(),
            }));
        }
        if message.base_url.is_empty() {
            return Err(self.fail(HttpError::MissingUrl {
                endpoint: self.name.clone(),
            }));
        }
        if !util::is_valid_url(&message.base_url) {
            return Err(self.fail(HttpError::InvalidUrl {
                endpoint: self.name.clone(),
                url: message.base_url.clone(),
            }));
        }
        Ok(())
    }

    fn build_request(&self, message: &RequestMessage) -> Result<reqwest::Request, HttpError> {
        let joined = util::join_url(&message.base_url, &message.path);
        let mut url = Url::parse(&joined).map_err(|_| HttpError::InvalidUrl {
            endpoint: self.name.clone(),
            url: joined.clone(),
        })?;

        if !message.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, values) in &message.query_params {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }

        // method presence was checked in validate_message_to_send
        let method = message.method.unwrap_or_default().as_http();
        let mut builder = self.client.request(method, url);
        for (name, value) in &message.message.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !message.message.payload.is_empty() {
            builder = builder.body(message.message.payload.clone());
        }

        builder.build().map_err(|err| {
            self.fail(HttpError::BuildRequest {
                endpoint: self.name.clone(),
                source: err,
            })
        })
    }

    fn fail(&self, err: HttpError) -> HttpError {
        error!(endpoint = %self.name, "{err}");
        err
    }
}

/// Builder accumulating client endpoint configuration.
#[derive(Debug, Default)]
pub struct ClientEndpointBuilder {
    name: String,
    base_url: String,
    content_type: String,
    timeout: Option<Duration>,
    tracker: Option<ActionTracker>,
}

impl ClientEndpointBuilder {
    /// Sets the endpoint name used in diagnostics.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the base URL applied to messages without one.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the content type applied to messages without one.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sets the action-timeout bounding every blocking wait on this endpoint.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Registers background calls with an externally owned tracker.
    #[must_use]
    pub fn tracker(mut self, tracker: &ActionTracker) -> Self {
        self.tracker = Some(tracker.clone());
        self
    }

    /// Builds the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ClientBuild`] when the HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<ClientEndpoint, HttpError> {
        let timeout = config::timeout_or_default(self.timeout);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| HttpError::ClientBuild { source: err })?;

        Ok(ClientEndpoint {
            name: self.name,
            base_url: self.base_url,
            content_type: self.content_type,
            timeout,
            client,
            exchange: Arc::new(Rendezvous::new()),
            tracker: self.tracker.unwrap_or_default(),
        })
    }
}
