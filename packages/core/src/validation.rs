use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Upper bound for short string columns (`username`, `email`, `title`).
pub const MAX_SHORT_TEXT: usize = 255;

/// Errors returned when boundary input cannot be turned into a typed
/// argument record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be a string, got {value}")]
    NotText { field: &'static str, value: String },

    #[error("{field} must be a positive integer id, got {value}")]
    InvalidId { field: &'static str, value: String },

    #[error("email must look like local@domain, got {0:?}")]
    InvalidEmail(String),

    #[error("cursor {0:?} is not a valid feed cursor")]
    InvalidCursor(String),
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid regex"));

/// A required string field: present, non-blank after trimming, and within
/// `max` characters. Returns the trimmed value.
pub fn required_text(
    field: &'static str,
    value: Option<String>,
    max: Option<usize>,
) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    check_len(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// An optional text field. Absent and blank both mean "no value".
pub fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: Option<usize>,
) -> Result<Option<String>, ValidationError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            check_len(field, s, max)?;
            Ok(Some(s.to_string()))
        }
    }
}

/// A field that may be omitted from a partial update, but must be non-blank
/// when present.
pub fn patch_text(
    field: &'static str,
    value: Option<String>,
    max: Option<usize>,
) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) => required_text(field, Some(v), max).map(Some),
    }
}

fn check_len(field: &'static str, s: &str, max: Option<usize>) -> Result<(), ValidationError> {
    match max {
        Some(max) if s.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

/// Validate and normalise an email address.
pub fn email(value: Option<String>) -> Result<String, ValidationError> {
    let email = required_text("email", value, Some(MAX_SHORT_TEXT))?;
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}

/// Coerce an id-like JSON value into a positive integer key.
///
/// Accepts integers and strings holding an integer (`"7"`), since HTML forms
/// and loosely-typed clients routinely send ids as strings.
pub fn coerce_id(field: &'static str, value: Option<&Value>) -> Result<i64, ValidationError> {
    let invalid = |v: &Value| ValidationError::InvalidId {
        field,
        value: v.to_string(),
    };
    let id = match value {
        None | Some(Value::Null) => return Err(ValidationError::Missing(field)),
        Some(v @ Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(v))?,
        Some(v @ Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid(v))?,
        Some(v) => return Err(invalid(v)),
    };
    if id <= 0 {
        return Err(ValidationError::InvalidId {
            field,
            value: id.to_string(),
        });
    }
    Ok(id)
}

/// Accept a loosely typed JSON text field. `null` and absence both mean no
/// value; anything other than a string is a validation error.
pub fn coerce_text(
    field: &'static str,
    value: Option<Value>,
) -> Result<Option<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v) => Err(ValidationError::NotText {
            field,
            value: v.to_string(),
        }),
    }
}

/// Parse an id taken from a URL path segment.
pub fn parse_id(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    coerce_id(field, Some(&Value::String(raw.to_string())))
}
