//! Domain operations over a [`Storage`] handle.
//!
//! [`SocialGraph`] is the single entry point the HTTP layer calls. It is
//! split by concern:
//!
//! | Module | Operations |
//! |--------|-----------|
//! | [`entities`] | create / get / update / delete for users, posts, comments |
//! | [`relations`] | `create_edge` / `remove_edge` for follows and likes |
//! | [`projection`] | user follow graph, post detail, post feed |
//!
//! Every operation returns a typed outcome. Nothing here logs or renders;
//! that is the caller's job.

pub mod entities;
pub mod projection;
pub mod relations;

use std::sync::Arc;

use sociograph::{Edge, EntityKind, ValidationError};

use crate::storage::{Storage, StorageError};

pub use projection::PostFeed;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Every way a domain operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Input was missing or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The primary entity of the operation does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    /// A unique constraint rejected the write.
    #[error("{0}")]
    UniquenessViolation(String),

    /// The edge is already present.
    #[error("{0} already exists")]
    AlreadyExists(Edge),

    /// The acting user of a relation operation does not exist.
    #[error("{entity} {id} not found")]
    SubjectNotFound { entity: EntityKind, id: i64 },

    /// The target of a relation operation does not exist.
    #[error("{entity} {id} not found")]
    ObjectNotFound { entity: EntityKind, id: i64 },

    /// The edge to remove is not present.
    #[error("{0} not found")]
    EdgeNotFound(Edge),

    /// The backend failed. The caller may retry.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl ServiceError {
    pub(crate) fn not_found(entity: EntityKind, id: impl Into<i64>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// `true` only for backend failures; every other kind is a definitive
    /// answer about the current state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::StorageUnavailable(_))
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Unique(constraint) => {
                ServiceError::UniquenessViolation(format!("unique constraint failed: {constraint}"))
            }
            StorageError::Unavailable(msg) => ServiceError::StorageUnavailable(msg),
            // Callers that can hit these map them with the context they have.
            other @ (StorageError::AlreadyExists | StorageError::ForeignKey) => {
                ServiceError::StorageUnavailable(format!("unexpected constraint failure: {other}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SocialGraph
// ---------------------------------------------------------------------------

/// The domain service. Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct SocialGraph {
    storage: Arc<dyn Storage>,
}

impl SocialGraph {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use sociograph::UserId;

    #[test]
    fn only_storage_failures_are_retryable() {
        assert!(ServiceError::StorageUnavailable("down".into()).is_retryable());
        assert!(!ServiceError::not_found(EntityKind::User, 1).is_retryable());
        assert!(!ServiceError::Validation(ValidationError::Missing("title")).is_retryable());
    }

    #[test]
    fn storage_errors_map_to_service_kinds() {
        assert!(matches!(
            ServiceError::from(StorageError::Unique("users.email".into())),
            ServiceError::UniquenessViolation(_)
        ));
        assert!(matches!(
            ServiceError::from(StorageError::Unavailable("io".into())),
            ServiceError::StorageUnavailable(_)
        ));
    }

    #[test]
    fn messages_name_the_entity() {
        let e = ServiceError::SubjectNotFound {
            entity: EntityKind::User,
            id: 999,
        };
        assert_eq!(e.to_string(), "user 999 not found");
        let e = ServiceError::AlreadyExists(Edge::follow(UserId(1), UserId(2)));
        assert_eq!(e.to_string(), "follow from user 1 to user 2 already exists");
    }
}
