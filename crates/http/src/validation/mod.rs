//! Validation engine: expected messages against captured exchanges.
//!
//! Each check is a pure function returning either success or a typed
//! [`Mismatch`]. The per-exchange entry points run every applicable check and
//! aggregate all failures into one [`Mismatches`] collection, so a failing
//! exchange reports everything that is wrong with it at once.
//!
//! Comparison is expected-driven and asymmetric: headers are compared with
//! case-insensitive names, query parameters as per-key set membership, and
//! payloads through the strategy selected by [`PayloadType`]. Extra actual
//! headers, parameters or values are never failures.

use std::fmt;

use http::{HeaderMap, Method, StatusCode};
use tracing::{debug, info};

use crate::exchange::{ReceivedRequest, ReceivedResponse};
use crate::message::{Message, RequestMessage, ResponseMessage};
use crate::util;

/// Payload comparison strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadType {
    /// Exact string equality.
    #[default]
    Plaintext,
    /// Structural JSON diff with `@ignore@` wildcard support.
    Json,
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Status code differs.
    Status {
        /// Expected status code.
        expected: u16,
        /// Actual status code.
        actual: u16,
    },
    /// Method differs.
    Method {
        /// Expected method string.
        expected: String,
        /// Actual method string.
        actual: String,
    },
    /// Path differs after normalization on both sides.
    Path {
        /// Expected path, normalized.
        expected: String,
        /// Actual path, normalized.
        actual: String,
    },
    /// An expected header is absent.
    HeaderMissing {
        /// Header name, lowercased.
        name: String,
    },
    /// An expected header value does not appear among the actual values.
    HeaderValue {
        /// Header name, lowercased.
        name: String,
        /// Expected value.
        expected: String,
        /// All actual values, joined.
        actual: String,
    },
    /// An expected query parameter is absent.
    QueryParamMissing {
        /// Parameter name.
        name: String,
    },
    /// An expected query parameter value does not appear among the actual values.
    QueryParamValues {
        /// Parameter name.
        name: String,
        /// Expected values, joined.
        expected: String,
        /// Actual values, joined.
        actual: String,
    },
    /// A payload was expected but the body is empty.
    PayloadMissing {
        /// Expected payload.
        expected: String,
    },
    /// Plain-text payloads differ.
    PayloadMismatch {
        /// Expected payload.
        expected: String,
        /// Actual payload.
        actual: String,
    },
    /// Structural JSON comparison found per-field mismatches.
    Json {
        /// Every field-level mismatch from the comparator.
        failures: Vec<accord_json::Mismatch>,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { expected, actual } => write!(
                f,
                "validation error - status mismatch - expected [{expected}] but received [{actual}]"
            ),
            Self::Method { expected, actual } => write!(
                f,
                "validation error - method mismatch - expected [{expected}] but received [{actual}]"
            ),
            Self::Path { expected, actual } => write!(
                f,
                "validation error - path mismatch - expected [{expected}] but received [{actual}]"
            ),
            Self::HeaderMissing { name } => {
                write!(f, "validation error - header <{name}> missing")
            }
            Self::HeaderValue {
                name,
                expected,
                actual,
            } => write!(
                f,
                "validation error - header <{name}> mismatch - expected [{expected}] but received [{actual}]"
            ),
            Self::QueryParamMissing { name } => {
                write!(f, "validation error - query param <{name}> missing")
            }
            Self::QueryParamValues {
                name,
                expected,
                actual,
            } => write!(
                f,
                "validation error - query param <{name}> values mismatch - expected [{expected}] but received [{actual}]"
            ),
            Self::PayloadMissing { expected } => write!(
                f,
                "validation error - payload missing - expected [{expected}] but received no payload"
            ),
            Self::PayloadMismatch { expected, actual } => write!(
                f,
                "validation error - payload mismatch - expected [{expected}] but received [{actual}]"
            ),
            Self::Json { failures } => {
                let rendered: Vec<String> = failures.iter().map(ToString::to_string).collect();
                write!(f, "json validation errors: [{}]", rendered.join(", "))
            }
        }
    }
}

impl std::error::Error for Mismatch {}

/// All mismatches from one exchange, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mismatches(Vec<Mismatch>);

impl Mismatches {
    /// True when every check passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the mismatches in check order.
    pub fn iter(&self) -> impl Iterator<Item = &Mismatch> {
        self.0.iter()
    }

    /// Renders every mismatch on its own line, prefixed with the endpoint name.
    #[must_use]
    pub fn render_prefixed(&self, endpoint: &str) -> String {
        let lines: Vec<String> = self
            .0
            .iter()
            .map(|mismatch| format!("{endpoint}: {mismatch}"))
            .collect();
        lines.join("\n")
    }
}

impl fmt::Display for Mismatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, mismatch) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{mismatch}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Mismatches {}

impl From<Vec<Mismatch>> for Mismatches {
    fn from(mismatches: Vec<Mismatch>) -> Self {
        Self(mismatches)
    }
}

/// Validates an incoming request against the expectation (server side).
#[must_use]
pub fn validate_request(
    expected: &RequestMessage,
    actual: &ReceivedRequest,
    payload_type: PayloadType,
) -> Mismatches {
    let mut failures = Vec::new();

    if let Err(mismatch) = validate_path(&expected.path, &actual.path) {
        failures.push(mismatch);
    }
    if let Err(mismatch) = validate_method(expected, &actual.method) {
        failures.push(mismatch);
    }
    failures.extend(validate_headers(&expected.message, &actual.headers));
    failures.extend(validate_query_params(expected, &actual.query_params));
    if let Err(mismatch) = validate_payload(&expected.message.payload, &actual.body, payload_type) {
        failures.push(mismatch);
    }

    report(&failures, "request");
    Mismatches(failures)
}

/// Validates a received response against the expectation (client side).
#[must_use]
pub fn validate_response(
    expected: &ResponseMessage,
    actual: &ReceivedResponse,
    payload_type: PayloadType,
) -> Mismatches {
    let mut failures = Vec::new();

    if let Err(mismatch) = validate_status(expected, actual.status) {
        failures.push(mismatch);
    }
    failures.extend(validate_headers(&expected.message, &actual.headers));
    if let Err(mismatch) = validate_payload(&expected.message.payload, &actual.body, payload_type) {
        failures.push(mismatch);
    }

    report(&failures, "response");
    Mismatches(failures)
}

fn report(failures: &[Mismatch], subject: &str) {
    if failures.is_empty() {
        info!("{subject} validation successful");
    } else {
        info!(count = failures.len(), "{subject} validation failed");
    }
}

/// Compares status codes exactly.
///
/// # Errors
///
/// Returns the mismatch when the codes differ.
pub fn validate_status(expected: &ResponseMessage, actual: StatusCode) -> Result<(), Mismatch> {
    if expected.status == actual.as_u16() {
        Ok(())
    } else {
        Err(Mismatch::Status {
            expected: expected.status,
            actual: actual.as_u16(),
        })
    }
}

/// Compares methods exactly; a message without a method never matches.
///
/// # Errors
///
/// Returns the mismatch when the methods differ.
pub fn validate_method(expected: &RequestMessage, actual: &Method) -> Result<(), Mismatch> {
    let expected_method = expected.method.map_or("", |method| method.as_str());
    if expected_method == actual.as_str() {
        Ok(())
    } else {
        Err(Mismatch::Method {
            expected: expected_method.to_string(),
            actual: actual.as_str().to_string(),
        })
    }
}

/// Compares paths after normalizing both sides.
///
/// # Errors
///
/// Returns the mismatch when the normalized paths differ.
pub fn validate_path(expected: &str, actual: &str) -> Result<(), Mismatch> {
    let expected = util::clean_path(expected);
    let actual = util::clean_path(actual);
    if expected == actual {
        Ok(())
    } else {
        Err(Mismatch::Path { expected, actual })
    }
}

/// Checks that every expected header appears among the actual headers.
///
/// Names are compared case-insensitively; each expected value must appear
/// among the actual header's values. Extra actual headers are ignored.
#[must_use]
pub fn validate_headers(expected: &Message, actual: &HeaderMap) -> Vec<Mismatch> {
    let mut failures = Vec::new();
    let mut names: Vec<&String> = expected.headers.keys().collect();
    names.sort();

    for name in names {
        let expected_value = &expected.headers[name];
        let lowered = name.to_lowercase();
        let actual_values: Vec<String> = actual
            .get_all(lowered.as_str())
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();

        if actual_values.is_empty() {
            failures.push(Mismatch::HeaderMissing { name: lowered });
        } else if !actual_values.iter().any(|value| value == expected_value) {
            failures.push(Mismatch::HeaderValue {
                name: lowered,
                expected: expected_value.clone(),
                actual: actual_values.join(", "),
            });
        }
    }

    failures
}

/// Checks that every expected query parameter exists and that each expected
/// value appears among the actual values for that key. Extra actual values
/// and parameters are ignored.
#[must_use]
pub fn validate_query_params(
    expected: &RequestMessage,
    actual: &std::collections::HashMap<String, Vec<String>>,
) -> Vec<Mismatch> {
    let mut failures = Vec::new();
    let mut names: Vec<&String> = expected.query_params.keys().collect();
    names.sort();

    for name in names {
        let expected_values = &expected.query_params[name];
        match actual.get(name) {
            None => failures.push(Mismatch::QueryParamMissing { name: name.clone() }),
            Some(actual_values) => {
                if !expected_values
                    .iter()
                    .all(|expected_value| actual_values.contains(expected_value))
                {
                    failures.push(Mismatch::QueryParamValues {
                        name: name.clone(),
                        expected: expected_values.join(", "),
                        actual: actual_values.join(", "),
                    });
                }
            }
        }
    }

    failures
}

/// Compares payloads under the selected strategy.
///
/// A blank expectation means "don't check". A non-blank expectation against
/// an empty body is always a mismatch.
///
/// # Errors
///
/// Returns the mismatch when the payloads disagree.
pub fn validate_payload(
    expected: &str,
    actual: &[u8],
    payload_type: PayloadType,
) -> Result<(), Mismatch> {
    if expected.is_empty() {
        debug!("expected payload is empty - no body validation will be done");
        return Ok(());
    }
    if actual.is_empty() {
        return Err(Mismatch::PayloadMissing {
            expected: expected.to_string(),
        });
    }

    match payload_type {
        PayloadType::Plaintext => {
            let actual = String::from_utf8_lossy(actual);
            if expected == actual {
                Ok(())
            } else {
                Err(Mismatch::PayloadMismatch {
                    expected: expected.to_string(),
                    actual: actual.into_owned(),
                })
            }
        }
        PayloadType::Json => {
            let comparison = accord_json::Comparator::new().compare(expected.as_bytes(), actual);
            if comparison.is_match() {
                debug!(log = %comparison.log(), "json payload validation");
                Ok(())
            } else {
                info!(log = %comparison.log(), "json payload validation failed");
                Err(Mismatch::Json {
                    failures: comparison.into_mismatches(),
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http::header::{HeaderName, HeaderValue};
    use pretty_assertions::assert_eq;

    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                name.parse::<HeaderName>().unwrap(),
                value.parse::<HeaderValue>().unwrap(),
            );
        }
        map
    }

    #[test]
    fn status_mismatch_names_both_codes() {
        let expected = ResponseMessage::new(200);
        let mismatch = validate_status(&expected, StatusCode::BAD_REQUEST).unwrap_err();

        assert_eq!(
            mismatch.to_string(),
            "validation error - status mismatch - expected [200] but received [400]"
        );
    }

    #[test]
    fn method_comparison_is_exact() {
        let expected = RequestMessage::post("x");
        assert!(validate_method(&expected, &Method::POST).is_ok());

        let mismatch = validate_method(&expected, &Method::GET).unwrap_err();
        assert_eq!(
            mismatch.to_string(),
            "validation error - method mismatch - expected [POST] but received [GET]"
        );
    }

    #[test]
    fn missing_method_never_matches() {
        let expected = RequestMessage::default();
        assert!(validate_method(&expected, &Method::GET).is_err());
    }

    #[test]
    fn paths_are_normalized_before_comparing() {
        assert!(validate_path("/myApp/", "myApp").is_ok());
        assert!(validate_path("my//resource/1234", "/my/resource/1234").is_ok());

        let mismatch = validate_path("/a/b", "/a/c").unwrap_err();
        assert_eq!(
            mismatch.to_string(),
            "validation error - path mismatch - expected [a/b] but received [a/c]"
        );
    }

    #[test]
    fn header_names_compare_case_insensitively() {
        let expected = RequestMessage::get("").with_header("etag", "abc");
        let actual = header_map(&[("ETag", "abc")]);

        assert!(validate_headers(&expected.message, &actual).is_empty());
    }

    #[test]
    fn missing_header_is_reported_lowercased() {
        let expected = RequestMessage::get("").with_etag("abc");
        let failures = validate_headers(&expected.message, &HeaderMap::new());

        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].to_string(),
            "validation error - header <etag> missing"
        );
    }

    #[test]
    fn header_value_must_appear_among_actual_values() {
        let expected = RequestMessage::get("").with_header("someHeader", "wrongValue");
        let actual = header_map(&[("someheader", "someValue")]);
        let failures = validate_headers(&expected.message, &actual);

        assert_eq!(
            failures[0].to_string(),
            "validation error - header <someheader> mismatch - expected [wrongValue] but received [someValue]"
        );
    }

    #[test]
    fn multi_valued_actual_header_matches_any_value() {
        let expected = RequestMessage::get("").with_header("accept", "text/plain");
        let actual = header_map(&[("accept", "application/json"), ("accept", "text/plain")]);

        assert!(validate_headers(&expected.message, &actual).is_empty());
    }

    #[test]
    fn all_header_failures_are_collected() {
        let expected = RequestMessage::get("")
            .with_header("a", "1")
            .with_header("b", "2");
        let failures = validate_headers(&expected.message, &HeaderMap::new());

        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn query_values_are_a_per_key_set_check() {
        let expected = RequestMessage::get("").with_query_param_values("k", ["v1", "v2"]);

        let mut actual = std::collections::HashMap::new();
        actual.insert(
            "k".to_string(),
            vec!["v2".to_string(), "extra".to_string(), "v1".to_string()],
        );
        assert!(validate_query_params(&expected, &actual).is_empty());

        actual.insert("k".to_string(), vec!["v1".to_string()]);
        let failures = validate_query_params(&expected, &actual);
        assert_eq!(
            failures[0].to_string(),
            "validation error - query param <k> values mismatch - expected [v1, v2] but received [v1]"
        );
    }

    #[test]
    fn missing_query_param_is_reported() {
        let expected = RequestMessage::get("").with_query_param("missing", "v");
        let failures = validate_query_params(&expected, &std::collections::HashMap::new());

        assert_eq!(
            failures[0].to_string(),
            "validation error - query param <missing> missing"
        );
    }

    #[test]
    fn blank_expected_payload_checks_nothing() {
        assert!(validate_payload("", b"anything at all", PayloadType::Plaintext).is_ok());
    }

    #[test]
    fn expected_payload_against_empty_body_is_missing() {
        let mismatch =
            validate_payload("expected payload", b"", PayloadType::Plaintext).unwrap_err();

        assert_eq!(
            mismatch.to_string(),
            "validation error - payload missing - expected [expected payload] but received no payload"
        );
    }

    #[test]
    fn plaintext_payloads_compare_exactly() {
        assert!(validate_payload("same", b"same", PayloadType::Plaintext).is_ok());

        let mismatch = validate_payload("expected payload", b"wrong payload", PayloadType::Plaintext)
            .unwrap_err();
        assert_eq!(
            mismatch.to_string(),
            "validation error - payload mismatch - expected [expected payload] but received [wrong payload]"
        );
    }

    #[test]
    fn json_payloads_ignore_wildcard_fields() {
        let expected = r#"{"success":true,"timestamp":"@ignore@"}"#;
        let actual = br#"{"success":true,"timestamp":683546323462}"#;

        assert!(validate_payload(expected, actual, PayloadType::Json).is_ok());
    }

    #[test]
    fn json_mismatch_carries_field_paths() {
        let expected = r#"{"success":true}"#;
        let actual = br#"{"success":false}"#;
        let mismatch = validate_payload(expected, actual, PayloadType::Json).unwrap_err();

        let rendered = mismatch.to_string();
        assert!(rendered.starts_with("json validation errors: ["));
        assert!(rendered.contains("$.success"));
    }

    #[test]
    fn request_validation_aggregates_every_failure() {
        let expected = RequestMessage::post("right/path")
            .with_header("x-trace", "1")
            .with_query_param("q", "v")
            .with_payload("body");
        let actual = ReceivedRequest {
            method: Method::GET,
            path: "/wrong/path".to_string(),
            query_params: std::collections::HashMap::new(),
            headers: HeaderMap::new(),
            body: bytes::Bytes::new(),
        };

        let failures = validate_request(&expected, &actual, PayloadType::Plaintext);

        // path, method, header, query param and payload all failed
        assert_eq!(failures.len(), 5);
    }

    #[test]
    fn response_validation_passes_on_matching_exchange() {
        let expected = ResponseMessage::new(200).with_etag("abc").with_payload("ok");
        let actual = ReceivedResponse {
            status: StatusCode::OK,
            headers: header_map(&[("ETag", "abc")]),
            body: bytes::Bytes::from_static(b"ok"),
        };

        assert!(validate_response(&expected, &actual, PayloadType::Plaintext).is_empty());
    }

    #[test]
    fn prefixed_rendering_names_the_endpoint_on_every_line() {
        let failures = Mismatches(vec![
            Mismatch::HeaderMissing {
                name: "etag".to_string(),
            },
            Mismatch::Status {
                expected: 200,
                actual: 500,
            },
        ]);

        let rendered = failures.render_prefixed("orderClient");
        for line in rendered.lines() {
            assert!(line.starts_with("orderClient: validation error - "));
        }
    }
}
