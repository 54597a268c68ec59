//! Input validation for `Check`.
//!
//! Fields are checked independently and every failure is collected, so the
//! user sees all problems in one pass instead of fixing them one at a time.
//! Failures are sorted by property name for deterministic output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single per-field validation failure reported by `Check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// The camelCase property name that failed validation.
    pub property: String,
    /// Human-readable reason for the failure.
    pub reason: String,
}

impl CheckFailure {
    fn new(property: &str, reason: &str) -> Self {
        Self {
            property: property.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Check that a required field is present and a non-empty string.
pub fn check_non_empty_string(key: &str, value: Option<&Value>) -> Option<CheckFailure> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => None,
        _ => Some(CheckFailure::new(
            key,
            "this input must be a non-empty string",
        )),
    }
}

/// Check that an optional field, if present, is a non-empty string.
///
/// Absence (or an explicit null) is allowed.
pub fn check_optional_string(key: &str, value: Option<&Value>) -> Option<CheckFailure> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.is_empty() => None,
        Some(_) => Some(CheckFailure::new(key, "this input must be a string")),
    }
}

/// Validate a property bag against lists of required and optional string
/// fields, returning all failures sorted by property name.
pub fn collect_failures(
    news: &Map<String, Value>,
    required: &[&str],
    optional: &[&str],
) -> Vec<CheckFailure> {
    let mut failures = Vec::new();
    for key in required {
        if let Some(failure) = check_non_empty_string(key, news.get(*key)) {
            failures.push(failure);
        }
    }
    for key in optional {
        if let Some(failure) = check_optional_string(key, news.get(*key)) {
            failures.push(failure);
        }
    }
    failures.sort_by(|a, b| a.property.cmp(&b.property));
    failures
}
