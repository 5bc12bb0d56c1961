//! Accord JSON - structural comparison of JSON documents.
//!
//! Compares an expected JSON payload against an actual one field by field and
//! reports every mismatch at once, each with the path of the offending field.
//! An expected string equal to [`IGNORE_VALUE`] matches any actual value at
//! that position, which lets tests skip server-generated fields such as
//! timestamps or ids.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Sentinel expected value matching any actual value at the same position.
pub const IGNORE_VALUE: &str = "@ignore@";

/// A single point of disagreement between the two documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// One of the documents is not valid JSON.
    #[error("could not parse {side} payload - {detail}")]
    Parse {
        /// Which document failed to parse ("expected" or "actual").
        side: &'static str,
        /// Parser error description.
        detail: String,
    },

    /// A field present in the expected document is absent from the actual one.
    #[error("field <{path}> missing - expected [{expected}]")]
    FieldMissing {
        /// Path of the missing field.
        path: String,
        /// Expected value, rendered as JSON.
        expected: String,
    },

    /// The two values at a path have different JSON types.
    #[error("field <{path}> type mismatch - expected {expected} but received {actual}")]
    TypeMismatch {
        /// Path of the field.
        path: String,
        /// Expected JSON type name.
        expected: &'static str,
        /// Actual JSON type name.
        actual: &'static str,
    },

    /// The two values at a path differ.
    #[error("field <{path}> value mismatch - expected [{expected}] but received [{actual}]")]
    ValueMismatch {
        /// Path of the field.
        path: String,
        /// Expected value, rendered as JSON.
        expected: String,
        /// Actual value, rendered as JSON.
        actual: String,
    },

    /// Two arrays at a path have different lengths.
    #[error("field <{path}> length mismatch - expected [{expected}] but received [{actual}]")]
    LengthMismatch {
        /// Path of the array.
        path: String,
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        actual: usize,
    },
}

/// Outcome of one comparison: a human-readable log plus all mismatches found.
#[derive(Debug, Clone)]
pub struct Comparison {
    log: String,
    mismatches: Vec<Mismatch>,
}

impl Comparison {
    /// True when the actual document satisfied every expectation.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Human-readable trace of every field visited.
    #[must_use]
    pub fn log(&self) -> &str {
        &self.log
    }

    /// All mismatches, in document order.
    #[must_use]
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Consumes the comparison, yielding the mismatches.
    #[must_use]
    pub fn into_mismatches(self) -> Vec<Mismatch> {
        self.mismatches
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log)
    }
}

/// Field-by-field JSON comparator.
///
/// Comparison is driven by the expected document: every expected field must
/// be present and equal in the actual document, while actual-only fields are
/// recorded in the log but are not mismatches. Arrays are compared element by
/// element and must have equal lengths.
#[derive(Debug, Default, Clone, Copy)]
pub struct Comparator;

impl Comparator {
    /// Creates a comparator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compares the expected payload against the actual one.
    #[must_use]
    pub fn compare(&self, expected: &[u8], actual: &[u8]) -> Comparison {
        let mut state = Walk::default();

        let expected: Value = match serde_json::from_slice(expected) {
            Ok(value) => value,
            Err(err) => return state.into_parse_failure("expected", &err),
        };
        let actual: Value = match serde_json::from_slice(actual) {
            Ok(value) => value,
            Err(err) => return state.into_parse_failure("actual", &err),
        };

        state.compare_values("$", &expected, &actual);
        Comparison {
            log: state.log,
            mismatches: state.mismatches,
        }
    }
}

#[derive(Default)]
struct Walk {
    log: String,
    mismatches: Vec<Mismatch>,
}

impl Walk {
    fn into_parse_failure(mut self, side: &'static str, err: &serde_json::Error) -> Comparison {
        self.note(&format!("$: could not parse {side} payload"));
        self.mismatches.push(Mismatch::Parse {
            side,
            detail: err.to_string(),
        });
        Comparison {
            log: self.log,
            mismatches: self.mismatches,
        }
    }

    fn compare_values(&mut self, path: &str, expected: &Value, actual: &Value) {
        if let Value::String(text) = expected {
            if text == IGNORE_VALUE {
                self.note(&format!("{path}: ignored"));
                return;
            }
        }

        match (expected, actual) {
            (Value::Object(expected), Value::Object(actual)) => {
                for (key, expected_value) in expected {
                    let child = format!("{path}.{key}");
                    match actual.get(key) {
                        Some(actual_value) => {
                            self.compare_values(&child, expected_value, actual_value);
                        }
                        None => {
                            self.note(&format!("{child}: missing"));
                            self.mismatches.push(Mismatch::FieldMissing {
                                path: child,
                                expected: expected_value.to_string(),
                            });
                        }
                    }
                }
                for key in actual.keys().filter(|key| !expected.contains_key(*key)) {
                    self.note(&format!("{path}.{key}: not expected, skipped"));
                }
            }
            (Value::Array(expected), Value::Array(actual)) => {
                if expected.len() != actual.len() {
                    self.note(&format!("{path}: length mismatch"));
                    self.mismatches.push(Mismatch::LengthMismatch {
                        path: path.to_string(),
                        expected: expected.len(),
                        actual: actual.len(),
                    });
                    return;
                }
                for (index, (expected_value, actual_value)) in
                    expected.iter().zip(actual).enumerate()
                {
                    let child = format!("{path}[{index}]");
                    self.compare_values(&child, expected_value, actual_value);
                }
            }
            _ if type_name(expected) != type_name(actual) => {
                self.note(&format!("{path}: type mismatch"));
                self.mismatches.push(Mismatch::TypeMismatch {
                    path: path.to_string(),
                    expected: type_name(expected),
                    actual: type_name(actual),
                });
            }
            _ if expected == actual => {
                self.note(&format!("{path}: match"));
            }
            _ => {
                self.note(&format!(
                    "{path}: mismatch - expected [{expected}] but received [{actual}]"
                ));
                self.mismatches.push(Mismatch::ValueMismatch {
                    path: path.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
    }

    fn note(&mut self, line: &str) {
        if !self.log.is_empty() {
            self.log.push('\n');
        }
        self.log.push_str(line);
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
