//! Standard error response body.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "email a@x is already in use", "code": "uniqueness_violation" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code.
    ///
    /// | `code` | HTTP status |
    /// |--------|------------|
    /// | `invalid_json` | 400 |
    /// | `not_found` | 404 |
    /// | `edge_not_found` | 404 |
    /// | `uniqueness_violation` | 409 |
    /// | `already_exists` | 409 |
    /// | `validation_failed` | 422 |
    /// | `storage_unavailable` | 503 |
    pub code: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a static code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }
}

/// Well-known error codes.
pub mod codes {
    pub const INVALID_JSON: &str = "invalid_json";
    pub const NOT_FOUND: &str = "not_found";
    pub const EDGE_NOT_FOUND: &str = "edge_not_found";
    pub const UNIQUENESS_VIOLATION: &str = "uniqueness_violation";
    pub const ALREADY_EXISTS: &str = "already_exists";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const STORAGE_UNAVAILABLE: &str = "storage_unavailable";
}

/// Plain acknowledgement body, e.g. `{ "message": "Followed user" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,

    /// Number of rows removed, for delete operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            deleted: None,
        }
    }

    pub fn deleted(message: impl Into<String>, count: u64) -> Self {
        Self {
            message: message.into(),
            deleted: Some(count),
        }
    }
}
