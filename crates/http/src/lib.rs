//! Accord HTTP - simulate both sides of an HTTP exchange inside a test.
//!
//! A test builds a [`client::ClientEndpoint`] and/or a
//! [`server::ServerEndpoint`] once per suite, then drives a conversation as a
//! sequence of blocking steps:
//!
//! ```no_run
//! # async fn conversation() -> Result<(), accord_http::HttpError> {
//! use accord_http::client::ClientEndpoint;
//! use accord_http::server::ServerEndpoint;
//! use accord_http::{RequestMessage, ResponseMessage};
//!
//! let server = ServerEndpoint::builder()
//!     .name("orderService")
//!     .port(8083)
//!     .build()
//!     .await?;
//! let client = ClientEndpoint::builder()
//!     .name("orderClient")
//!     .base_url("http://localhost:8083/orders")
//!     .build()?;
//!
//! client.send().message(&RequestMessage::get("").with_query_param("id", "42")).await?;
//!
//! server.receive().message(&RequestMessage::get("orders").with_query_param("id", "42")).await?;
//! server.send().message(&ResponseMessage::new(200).with_payload("shipped")).await?;
//!
//! client.receive().message(&ResponseMessage::new(200).with_payload("shipped")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! `send` on a client starts the call in the background and returns
//! immediately; `receive` blocks until the background outcome is available
//! and validates it. On a server, `receive` blocks until a request arrives
//! and validates it, and `send` hands the waiting request handler its
//! response. Every blocking wait is bounded by the endpoint's action-timeout,
//! so a step whose counterpart never happens fails with a clear error
//! instead of wedging the suite.

pub mod client;
pub mod error;
pub mod exchange;
pub mod message;
pub mod server;
pub mod validation;

mod util;

pub use error::HttpError;
pub use exchange::{ReceivedRequest, ReceivedResponse};
pub use message::{headers, HttpMethod, RequestMessage, ResponseMessage};
pub use validation::PayloadType;
