//! HTTP request handlers for all Sociograph node endpoints.
//!
//! Each submodule covers a logical group of endpoints. Handlers are thin
//! async functions: they turn extractors into typed argument records, call
//! one [`SocialGraph`] operation, and return
//! `Result<impl IntoResponse, AppError>`.
//!
//! Body and query extractors are taken as `Result<_, Rejection>` so that a
//! malformed request surfaces as an [`AppError`] with the standard error
//! body instead of axum's plain-text rejection.
//!
//! [`AppError`]: crate::error::AppError

pub mod comments;
pub mod health;
pub mod posts;
pub mod relations;
pub mod users;

use sociograph::{validation, PostId, UserId, ValidationError};

use crate::{config::NodeConfig, service::SocialGraph};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub graph: SocialGraph,
    pub config: NodeConfig,
}

/// Parse a `{id}` path segment naming a user.
pub(crate) fn user_id(raw: &str) -> Result<UserId, ValidationError> {
    validation::parse_id("id", raw).map(UserId)
}

/// Parse a `{id}` path segment naming a post.
pub(crate) fn post_id(raw: &str) -> Result<PostId, ValidationError> {
    validation::parse_id("id", raw).map(PostId)
}
