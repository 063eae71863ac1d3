//! Domain model for Sociograph, a social-graph backend.
//!
//! This crate holds the parts of the system that do not touch storage or
//! HTTP: entity and edge types, the typed argument records each mutating
//! operation takes, and the validation that builds them from loosely-typed
//! boundary input.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Rows ([`User`], [`Post`], [`Comment`]), [`Edge`], projections |
//! | [`args`] | Validated argument records: [`NewUser`], [`NewPost`], [`PostPatch`], ... |
//! | [`validation`] | Field-level checks and id coercion, [`ValidationError`] |

pub mod args;
pub mod types;
pub mod validation;

pub use args::{DescriptionChange, NewComment, NewPost, NewUser, PostPatch, UserPatch};
pub use types::{
    Comment, CommentId, Deleted, Edge, EdgeKind, EntityKind, Post, PostCursor, PostDetail, PostId,
    User, UserGraph, UserId, UserSummary,
};
pub use validation::ValidationError;
