//! Validation failures: every scenario completes the HTTP exchange and then
//! checks the errors each step reported.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use accord_http::client::ClientEndpoint;
use accord_http::{HttpError, RequestMessage, ResponseMessage};

fn collect(step: Result<(), HttpError>, errors: &mut Vec<String>) {
    if let Err(err) = step {
        errors.push(err.to_string());
    }
}

fn collect_receive<T>(step: Result<T, HttpError>, errors: &mut Vec<String>) {
    if let Err(err) = step {
        errors.push(err.to_string());
    }
}

// Server responds with 400 Bad Request while the client expects 200 OK.
#[tokio::test]
async fn status_code_mismatch() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(400))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["status mismatch - expected [200] but received [400]"],
    );
    conversation.finish().await;
}

// Client sends GET while the server expects POST.
#[tokio::test]
async fn method_mismatch() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::post("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(500))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(500))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["validation error - method mismatch - expected [POST] but received [GET]"],
    );
    conversation.finish().await;
}

// Server expects a path the client never requested.
#[tokio::test]
async fn path_mismatch() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get("orders"))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp/invoices"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["validation error - path mismatch - expected [myApp/invoices] but received [myApp/orders]"],
    );
    conversation.finish().await;
}

// The client expects a response header the server never set.
#[tokio::test]
async fn response_header_missing() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200).with_etag("132r1r312e1"))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["testClient: validation error - header <etag> missing"],
    );
    conversation.finish().await;
}

// The header exists but with a different value.
#[tokio::test]
async fn response_header_value_mismatch() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(200).with_header("someHeader", "someValue"))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200).with_header("someHeader", "wrongValue"))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["validation error - header <someheader> mismatch - expected [wrongValue] but received [someValue]"],
    );
    conversation.finish().await;
}

// Expected plain-text payload, but the response body is empty.
#[tokio::test]
async fn response_payload_missing() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200).with_payload("expected payload"))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["validation error - payload missing - expected [expected payload] but received no payload"],
    );
    conversation.finish().await;
}

// Plain-text payloads differ.
#[tokio::test]
async fn response_payload_mismatch() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(200).with_payload("wrong payload"))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200).with_payload("expected payload"))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["validation error - payload mismatch - expected [expected payload] but received [wrong payload]"],
    );
    conversation.finish().await;
}

// The server expects a query parameter the client never sent, and more
// values for another one than the client provided.
#[tokio::test]
async fn query_param_missing_and_values_mismatch() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get("").with_query_param("present", "v1"))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(
                &RequestMessage::get("myApp")
                    .with_query_param("absent", "whatever")
                    .with_query_param_values("present", ["v1", "v2"]),
            )
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(200))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &[
            "validation error - query param <absent> missing",
            "validation error - query param <present> values mismatch - expected [v1, v2] but received [v1]",
        ],
    );
    conversation.finish().await;
}

// Server receives a message to send with an invalid status code. The send
// action fails, and the handler still closes the exchange with a default 500.
#[tokio::test]
async fn invalid_status_code_still_completes_the_exchange() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(99))
            .await,
        &mut errors,
    );
    // the handler wrote the default 500, so the client is not left hanging
    collect_receive(
        conversation
            .client
            .receive()
            .message(&ResponseMessage::new(500))
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &["message to send is invalid - unsupported status code [99]"],
    );
    assert_eq!(errors.len(), 1, "only the send step should fail: {errors:?}");
    conversation.finish().await;
}

// A single failing exchange reports every mismatch at once.
#[tokio::test]
async fn all_mismatches_are_reported_together() {
    let conversation = common::start().await;
    let mut errors = Vec::new();

    collect(
        conversation
            .client
            .send()
            .message(&RequestMessage::get(""))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .server
            .receive()
            .message(&RequestMessage::get("myApp"))
            .await,
        &mut errors,
    );
    collect(
        conversation
            .server
            .send()
            .message(&ResponseMessage::new(400).with_payload("wrong"))
            .await,
        &mut errors,
    );
    collect_receive(
        conversation
            .client
            .receive()
            .message(
                &ResponseMessage::new(200)
                    .with_etag("abc")
                    .with_payload("right"),
            )
            .await,
        &mut errors,
    );

    common::check_errors(
        &errors,
        &[
            "status mismatch - expected [200] but received [400]",
            "header <etag> missing",
            "payload mismatch - expected [right] but received [wrong]",
        ],
    );
    conversation.finish().await;
}

// Synchronous send validation: no background work is started for messages
// that cannot possibly reach the wire.
#[tokio::test]
async fn send_pre_validation_rejects_unusable_messages() {
    accord_core::telemetry::init();
    let bare_client = ClientEndpoint::builder()
        .name("bareClient")
        .timeout(common::SHORT_TIMEOUT)
        .build()
        .unwrap();

    let err = bare_client
        .send()
        .message(&RequestMessage::default().with_base_url("http://localhost:1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing HTTP method"), "{err}");

    let err = bare_client
        .send()
        .message(&RequestMessage::get("items"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing url"), "{err}");

    let err = bare_client
        .send()
        .message(&RequestMessage::get("items").with_base_url("localhost:8080"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid url"), "{err}");

    // nothing was started, so a receive can only time out
    let err = bare_client
        .receive()
        .message(&ResponseMessage::new(200))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"), "{err}");
}

// The background call's transport error surfaces on receive, wrapped with
// endpoint context.
#[tokio::test]
async fn transport_error_surfaces_on_receive() {
    accord_core::telemetry::init();

    // bind and immediately drop a listener to find a port that refuses
    let refused_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    };

    let client = ClientEndpoint::builder()
        .name("lonelyClient")
        .base_url(format!("http://127.0.0.1:{refused_port}"))
        .timeout(common::ACTION_TIMEOUT)
        .build()
        .unwrap();

    client
        .send()
        .message(&RequestMessage::get("anything"))
        .await
        .unwrap();

    let err = client
        .receive()
        .message(&ResponseMessage::new(200))
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("lonelyClient: error while receiving response"),
        "{err}"
    );

    client.tracker().wait_idle().await;
}
