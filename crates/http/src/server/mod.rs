//! Server endpoint: a three-phase protocol around an inbound HTTP listener.
//!
//! Every inbound request runs on its own handler task and rendezvouses with
//! the test twice: first the captured request is offered to a `receive`
//! action for validation, then the handler blocks until a `send` action
//! supplies the response to write back. The test therefore controls exactly
//! when a response goes out.
//!
//! All handler tasks share the endpoint's two channels. With several requests
//! in flight concurrently, `receive`/`send` calls pair with whichever handler
//! rendezvouses first - there is no request-identifier correlation, so a test
//! driving concurrent requests must sequence its actions itself.

mod actions;

pub use actions::{ReceiveAction, SendAction};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use accord_core::{config, ActionTracker, Rendezvous};
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, error, info, warn};

use crate::error::HttpError;
use crate::exchange::ReceivedRequest;
use crate::message::{RequestMessage, ResponseMessage};
use crate::validation::{self, PayloadType};

/// Outcome a `send` action offers to the blocked request handler: the
/// response to write, or the reason it was rejected.
type SendOutcome = Result<ResponseMessage, String>;

/// A named, pre-configured handle receiving real HTTP requests in a test.
///
/// Build one per suite with [`ServerEndpoint::builder`]; the listener starts
/// immediately and should be stopped with [`ServerEndpoint::shutdown`] at
/// teardown.
#[derive(Debug)]
pub struct ServerEndpoint {
    name: String,
    content_type: String,
    timeout: Duration,
    local_addr: SocketAddr,
    requests: Arc<Rendezvous<ReceivedRequest>>,
    responses: Arc<Rendezvous<SendOutcome>>,
    tracker: ActionTracker,
    shutdown: Option<oneshot::Sender<()>>,
    serve_task: Option<JoinHandle<()>>,
}

/// Per-request state handed to every handler invocation.
#[derive(Debug, Clone)]
struct EndpointContext {
    name: String,
    requests: Arc<Rendezvous<ReceivedRequest>>,
    responses: Arc<Rendezvous<SendOutcome>>,
    tracker: ActionTracker,
    timeout: Duration,
}

impl ServerEndpoint {
    /// Returns a builder for a server endpoint.
    #[must_use]
    pub fn builder() -> ServerEndpointBuilder {
        ServerEndpointBuilder::default()
    }

    /// The endpoint name used to prefix diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The address the listener is bound to.
    ///
    /// With port `0` this is where the ephemeral port can be read back.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The tracker counting this endpoint's in-flight request handlers.
    #[must_use]
    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }

    /// Starts a receive action.
    #[must_use]
    pub fn receive(&self) -> ReceiveAction<'_> {
        ReceiveAction::new(self)
    }

    /// Starts a send action.
    #[must_use]
    pub fn send(&self) -> SendAction<'_> {
        SendAction::new(self)
    }

    /// Stops the listener and waits for it, then drains in-flight handlers.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(serve_task) = self.serve_task.take() {
            if serve_task.await.is_err() {
                error!(endpoint = %self.name, "listener task failed during shutdown");
            } else {
                info!(endpoint = %self.name, "closed server");
            }
        }
        self.tracker.wait_idle().await;
    }

    pub(crate) async fn do_receive(
        &self,
        expected: &RequestMessage,
        payload_type: PayloadType,
    ) -> Result<ReceivedRequest, HttpError> {
        debug!(endpoint = %self.name, message = %expected, "message to receive");
        let expected = self.message_to_receive(expected);

        match self.requests.recv_timeout(self.timeout).await {
            Ok(request) => {
                debug!(endpoint = %self.name, message = %expected, "validating message");

                let failures = validation::validate_request(&expected, &request, payload_type);
                if failures.is_empty() {
                    Ok(request)
                } else {
                    Err(self.fail(HttpError::Validation {
                        endpoint: self.name.clone(),
                        failures,
                    }))
                }
            }
            Err(_) => Err(self.fail(HttpError::ReceiveTimeout {
                endpoint: self.name.clone(),
                subject: "request",
            })),
        }
    }

    pub(crate) async fn do_send(&self, message: &ResponseMessage) -> Result<(), HttpError> {
        let message_to_send = self.message_to_send(message);
        let validation = self.validate_message_to_send(&message_to_send);

        // the handler must always get a signal, even for an invalid message,
        // so the HTTP exchange can complete with a default error response
        let outcome = match &validation {
            Ok(()) => Ok(message_to_send),
            Err(err) => Err(err.to_string()),
        };

        match self.responses.send_timeout(outcome, self.timeout).await {
            Ok(()) => validation,
            Err(_) => Err(self.fail(HttpError::SendTimeout {
                endpoint: self.name.clone(),
            })),
        }
    }

    /// Fills in the endpoint content type on a clone of the expectation.
    fn message_to_receive(&self, expected: &RequestMessage) -> RequestMessage {
        let mut message_to_receive = expected.clone();
        message_to_receive
            .message
            .default_content_type(&self.content_type);
        message_to_receive
    }

    /// Fills in the endpoint content type on a clone of the outgoing message.
    fn message_to_send(&self, message: &ResponseMessage) -> ResponseMessage {
        let mut message_to_send = message.clone();
        message_to_send
            .message
            .default_content_type(&self.content_type);
        message_to_send
    }

    fn validate_message_to_send(&self, message: &ResponseMessage) -> Result<(), HttpError> {
        if message.status < 100 || message.status > 999 {
            return Err(self.fail(HttpError::UnsupportedStatusCode {
                endpoint: self.name.clone(),
                status: message.status,
            }));
        }
        Ok(())
    }

    fn fail(&self, err: HttpError) -> HttpError {
        error!(endpoint = %self.name, "{err}");
        err
    }
}

impl Drop for ServerEndpoint {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Handles one inbound request: offer it for validation, then wait for the
/// response the test wants to send back.
async fn handle_exchange(State(ctx): State<EndpointContext>, request: Request) -> Response {
    let _guard = ctx.tracker.register();

    let received = match ReceivedRequest::capture(request).await {
        Ok(received) => received,
        Err(err) => {
            error!(endpoint = %ctx.name, "could not read request body - {err}");
            return default_error_response();
        }
    };

    info!(
        endpoint = %ctx.name,
        method = %received.method,
        path = %received.path,
        payload = %received.body_text(),
        "received HTTP request"
    );

    if ctx.requests.send_timeout(received, ctx.timeout).await.is_ok() {
        debug!(endpoint = %ctx.name, "received request was sent to validation channel");
    } else {
        warn!(
            endpoint = %ctx.name,
            "request handling timed out - no server receive action called in test"
        );
    }

    match ctx.responses.recv_timeout(ctx.timeout).await {
        Ok(Ok(message)) => write_response(&ctx, &message),
        Ok(Err(reason)) => {
            error!(
                endpoint = %ctx.name,
                %reason,
                "request handler received an invalid response message"
            );
            default_error_response()
        }
        Err(_) => {
            warn!(
                endpoint = %ctx.name,
                "response handling timed out - no server send action called in test"
            );
            default_error_response()
        }
    }
}

fn write_response(ctx: &EndpointContext, message: &ResponseMessage) -> Response {
    let mut builder = Response::builder().status(message.status);
    for (name, value) in &message.message.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    match builder.body(axum::body::Body::from(message.message.payload.clone())) {
        Ok(response) => {
            info!(
                endpoint = %ctx.name,
                status = message.status,
                payload = %message.message.payload,
                "sending response"
            );
            response
        }
        Err(err) => {
            error!(endpoint = %ctx.name, "could not write response - {err}");
            default_error_response()
        }
    }
}

/// The 500 written whenever the test never supplied a usable response,
/// keeping the HTTP exchange from hanging.
fn default_error_response() -> Response {
    let mut response = Response::new(axum::body::Body::empty());
    *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Builder accumulating server endpoint configuration.
#[derive(Debug, Default)]
pub struct ServerEndpointBuilder {
    name: String,
    port: u16,
    content_type: String,
    timeout: Option<Duration>,
    tracker: Option<ActionTracker>,
}

impl ServerEndpointBuilder {
    /// Sets the endpoint name used in diagnostics.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the port to listen on; `0` picks an ephemeral port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
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

    /// Registers request handlers with an externally owned tracker.
    #[must_use]
    pub fn tracker(mut self, tracker: &ActionTracker) -> Self {
        self.tracker = Some(tracker.clone());
        self
    }

    /// Binds the listener and starts serving.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Bind`] when the port cannot be bound.
    pub async fn build(self) -> Result<ServerEndpoint, HttpError> {
        let timeout = config::timeout_or_default(self.timeout);
        let tracker = self.tracker.unwrap_or_default();
        let requests = Arc::new(Rendezvous::new());
        let responses = Arc::new(Rendezvous::new());

        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|err| HttpError::Bind {
                endpoint: self.name.clone(),
                source: err,
            })?;
        let local_addr = listener.local_addr().map_err(|err| HttpError::Bind {
            endpoint: self.name.clone(),
            source: err,
        })?;

        let ctx = EndpointContext {
            name: self.name.clone(),
            requests: Arc::clone(&requests),
            responses: Arc::clone(&responses),
            tracker: tracker.clone(),
            timeout,
        };
        let app = Router::new()
            .fallback(handle_exchange)
            .layer(CatchPanicLayer::new())
            .with_state(ctx);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let endpoint_name = self.name.clone();
        let serve_task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                error!(endpoint = %endpoint_name, "listener error - {err}");
            }
        });

        info!(endpoint = %self.name, %local_addr, "server endpoint listening");

        Ok(ServerEndpoint {
            name: self.name,
            content_type: self.content_type,
            timeout,
            local_addr,
            requests,
            responses,
            tracker,
            shutdown: Some(shutdown_tx),
            serve_task: Some(serve_task),
        })
    }
}
