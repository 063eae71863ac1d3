//! Application-level error type returned by handlers.
//!
//! All variants serialise to [`ErrorResponse`] and map to the appropriate
//! HTTP status code.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sociograph::ValidationError;
use sociograph_api::{codes, ErrorResponse};

use crate::service::ServiceError;

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    /// The request body or query string could not be parsed at all.
    InvalidJson(String),
    /// A domain operation failed.
    Service(ServiceError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidJson(_) => (StatusCode::BAD_REQUEST, codes::INVALID_JSON),
            AppError::Service(e) => match e {
                ServiceError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, codes::VALIDATION_FAILED)
                }
                ServiceError::NotFound { .. }
                | ServiceError::SubjectNotFound { .. }
                | ServiceError::ObjectNotFound { .. } => (StatusCode::NOT_FOUND, codes::NOT_FOUND),
                ServiceError::EdgeNotFound(_) => (StatusCode::NOT_FOUND, codes::EDGE_NOT_FOUND),
                ServiceError::UniquenessViolation(_) => {
                    (StatusCode::CONFLICT, codes::UNIQUENESS_VIOLATION)
                }
                ServiceError::AlreadyExists(_) => (StatusCode::CONFLICT, codes::ALREADY_EXISTS),
                ServiceError::StorageUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, codes::STORAGE_UNAVAILABLE)
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = match self {
            AppError::InvalidJson(msg) => msg,
            AppError::Service(e) => {
                if e.is_retryable() {
                    tracing::warn!("storage failure: {e}");
                }
                e.to_string()
            }
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        AppError::Service(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Service(ServiceError::Validation(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidJson(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use sociograph::{Edge, EntityKind, UserId};

    use super::*;

    fn status_and_code(e: impl Into<AppError>) -> (StatusCode, &'static str) {
        e.into().parts()
    }

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(
            status_and_code(ValidationError::Missing("title")),
            (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed")
        );
        assert_eq!(
            status_and_code(ServiceError::SubjectNotFound {
                entity: EntityKind::User,
                id: 999
            }),
            (StatusCode::NOT_FOUND, "not_found")
        );
        let edge = Edge::follow(UserId(1), UserId(2));
        assert_eq!(
            status_and_code(ServiceError::AlreadyExists(edge)),
            (StatusCode::CONFLICT, "already_exists")
        );
        assert_eq!(
            status_and_code(ServiceError::EdgeNotFound(edge)),
            (StatusCode::NOT_FOUND, "edge_not_found")
        );
        assert_eq!(
            status_and_code(ServiceError::UniquenessViolation("email".into())),
            (StatusCode::CONFLICT, "uniqueness_violation")
        );
        assert_eq!(
            status_and_code(ServiceError::StorageUnavailable("locked".into())),
            (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
        );
    }

    #[test]
    fn invalid_json_is_400() {
        assert_eq!(
            AppError::InvalidJson("eof".into()).parts(),
            (StatusCode::BAD_REQUEST, "invalid_json")
        );
    }
}
