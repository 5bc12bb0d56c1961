//! Shared setup for conversation tests: one client and one server endpoint
//! wired together over an ephemeral loopback port.

#![allow(dead_code)]

use std::time::Duration;

use accord_core::ActionTracker;
use accord_http::client::ClientEndpoint;
use accord_http::server::ServerEndpoint;

/// Generous bound for steps that are expected to happen.
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(2);

/// Tight bound for steps that are expected to time out.
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(300);

pub struct Conversation {
    pub client: ClientEndpoint,
    pub server: ServerEndpoint,
    pub tracker: ActionTracker,
}

impl Conversation {
    /// Stops the server and drains every in-flight background action.
    pub async fn finish(self) {
        self.server.shutdown().await;
        self.tracker.wait_idle().await;
    }
}

/// Starts a conversation whose client targets `http://<server>/myApp`.
pub async fn start() -> Conversation {
    start_with_timeouts(ACTION_TIMEOUT, ACTION_TIMEOUT).await
}

/// Starts a conversation with distinct client/server action-timeouts.
pub async fn start_with_timeouts(
    client_timeout: Duration,
    server_timeout: Duration,
) -> Conversation {
    accord_core::telemetry::init();
    let tracker = ActionTracker::new();

    let server = ServerEndpoint::builder()
        .name("testServer")
        .port(0)
        .timeout(server_timeout)
        .tracker(&tracker)
        .build()
        .await
        .expect("server endpoint should bind");

    let client = ClientEndpoint::builder()
        .name("testClient")
        .base_url(format!("http://{}/myApp", server.local_addr()))
        .timeout(client_timeout)
        .tracker(&tracker)
        .build()
        .expect("client endpoint should build");

    Conversation {
        client,
        server,
        tracker,
    }
}

/// Asserts that the collected step errors contain every expected fragment.
pub fn check_errors(step_errors: &[String], expected: &[&str]) {
    assert!(
        !step_errors.is_empty(),
        "at least one error expected, but there was none"
    );
    let all = step_errors.join("\n");
    for fragment in expected {
        assert!(all.contains(fragment), "unexpected errors: {all}");
    }
}
