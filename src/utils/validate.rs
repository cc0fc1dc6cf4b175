//! Input validation for tool arguments and path identifiers.
//!
//! Every identifier that ends up interpolated into an outbound endpoint path
//! must go through [`safe_identifier`] first; the remaining helpers enforce
//! presence, type and enum constraints on raw tool arguments.

use serde_json::{Map, Value};
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Field '{field}' must be a {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("Field '{0}' must not be blank")]
    BlankField(String),

    #[error("Field '{field}' must be one of: {allowed}")]
    NotInSet { field: String, allowed: String },

    #[error("Field '{0}' must be a positive number")]
    NotPositive(String),

    #[error("Invalid identifier in '{0}': only letters, digits, '-' and '_' are allowed")]
    UnsafeIdentifier(String),
}

/// Validate an identifier before it is used as a URL path segment.
///
/// A safe identifier is non-empty and contains only ASCII letters, digits,
/// hyphens and underscores. Slashes, dots, percent signs and whitespace are
/// all rejected rather than normalized, which blocks path-segment injection
/// such as `123/../../admin`.
///
/// Returns the input unchanged on success.
pub fn safe_identifier(value: &str, field: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::UnsafeIdentifier(field.to_string()));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::UnsafeIdentifier(field.to_string()));
    }

    Ok(value.to_string())
}

/// Require a non-blank string field, returning it trimmed.
pub fn require_string(args: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ValidationError::BlankField(field.to_string()))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(ValidationError::WrongType {
            field: field.to_string(),
            expected: "string",
        }),
    }
}

/// Require a field coercible to a finite number.
pub fn require_number(args: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field.to_string())),
        Some(Value::Number(n)) => {
            n.as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ValidationError::WrongType {
                    field: field.to_string(),
                    expected: "finite number",
                })
        }
        Some(_) => Err(ValidationError::WrongType {
            field: field.to_string(),
            expected: "finite number",
        }),
    }
}

/// Optional string field: `None` when absent or null, otherwise validated
/// like [`require_string`].
pub fn optional_string(
    args: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => require_string(args, field).map(Some),
    }
}

/// Check enum membership against a fixed allowed set.
pub fn one_of(value: &str, field: &str, allowed: &[&str]) -> Result<String, ValidationError> {
    if allowed.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(ValidationError::NotInSet {
            field: field.to_string(),
            allowed: allowed.join(", "),
        })
    }
}
