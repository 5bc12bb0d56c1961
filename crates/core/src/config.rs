//! Process-wide configuration defaults.
//!
//! Values are read from environment variables with hard fallbacks, so a test
//! suite works out of the box and CI can still tighten or relax the timings
//! without touching code.

use std::time::Duration;

/// Environment variable overriding the default action-timeout, in milliseconds.
pub const ACTION_TIMEOUT_ENV: &str = "ACCORD_ACTION_TIMEOUT_MS";

const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the process-wide action-timeout.
///
/// This bounds every blocking wait inside endpoint `send`/`receive` actions
/// for endpoints that were built without an explicit timeout. Unset or
/// unparsable values fall back to 10 seconds.
#[must_use]
pub fn action_timeout() -> Duration {
    parse_action_timeout(std::env::var(ACTION_TIMEOUT_ENV).ok().as_deref())
}

/// Resolves an optional endpoint timeout against the process default.
///
/// A missing or zero duration means "not configured" and yields
/// [`action_timeout`].
#[must_use]
pub fn timeout_or_default(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(value) if !value.is_zero() => value,
        _ => action_timeout(),
    }
}

fn parse_action_timeout(raw: Option<&str>) -> Duration {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_ACTION_TIMEOUT)
}
