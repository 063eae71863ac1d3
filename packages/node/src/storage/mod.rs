//! Storage abstraction layer for the Sociograph node.
//!
//! The [`Storage`] trait is the contract between the service layer and
//! persistence. Storage owns the constraints: uniqueness of `users.email`,
//! the composite primary keys of the edge tables, and the foreign keys from
//! posts, comments, and edges to the rows they reference. Every mutating
//! method is a single atomic unit; constraint checks happen inside that unit,
//! never as a separate read beforehand.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, ephemeral nodes |
//! | [`SqliteStorage`] | Production; durable single-file database |
//!
//! [`MemoryStorage`]: memory::MemoryStorage
//! [`SqliteStorage`]: sqlite::SqliteStorage

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use sociograph::{
    Comment, CommentId, Edge, NewComment, NewPost, NewUser, Post, PostCursor, PostDetail, PostId,
    PostPatch, User, UserGraph, UserId, UserPatch,
};

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A unique constraint other than a primary key rejected the write.
    /// Carries the constraint name, e.g. `users.email`.
    #[error("unique constraint failed: {0}")]
    Unique(String),

    /// A composite primary key rejected the write: the edge already exists.
    #[error("row already exists")]
    AlreadyExists,

    /// A foreign key rejected the write: a referenced row does not exist.
    #[error("foreign key constraint failed")]
    ForeignKey,

    /// The backend could not complete the operation. Retryable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// PostQuery
// ---------------------------------------------------------------------------

/// Query parameters for [`Storage::list_posts`].
///
/// Posts are returned newest first, ties broken by ascending id.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Include only posts by this author.
    pub author: Option<UserId>,

    /// Keyset cursor: include only posts that sort strictly after it.
    pub after: Option<PostCursor>,

    /// Maximum number of posts to return. The implementation fetches
    /// `limit + 1` internally to determine `has_more`, then truncates.
    pub limit: u32,
}

/// Timestamp for a new row: the current time at microsecond precision,
/// but always strictly later than the newest row already in the table.
pub(crate) fn next_timestamp(latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match latest {
        Some(latest) if latest >= now => latest + TimeDelta::microseconds(1),
        _ => now,
    }
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// The persistence contract for a Sociograph node.
///
/// All methods are `async` and return `Result<_, StorageError>`. A missing
/// row is a normal outcome and is reported as `None` or a zero count, never
/// as an error. Implementations must be `Send + Sync + 'static` so they can
/// be held in an `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    // --- Users ---------------------------------------------------------------

    /// Insert a user, assigning its id and timestamps. Returns
    /// [`StorageError::Unique`] if the email is already taken.
    async fn insert_user(&self, user: &NewUser) -> Result<User, StorageError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Apply a partial update. Returns `None` if no user has this id.
    async fn update_user(&self, id: UserId, patch: &UserPatch)
        -> Result<Option<User>, StorageError>;

    // --- Posts ---------------------------------------------------------------

    /// Insert a post. Returns [`StorageError::ForeignKey`] if the author does
    /// not exist.
    async fn insert_post(&self, post: &NewPost) -> Result<Post, StorageError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError>;

    /// Apply a partial update. Returns `None` if no post has this id.
    async fn update_post(&self, id: PostId, patch: &PostPatch)
        -> Result<Option<Post>, StorageError>;

    /// Delete a post together with its likes and comments. Returns the
    /// number of post rows removed (0 or 1).
    async fn delete_post(&self, id: PostId) -> Result<u64, StorageError>;

    /// Return a page of posts matching `query`, plus whether more remain.
    async fn list_posts(&self, query: &PostQuery) -> Result<(Vec<Post>, bool), StorageError>;

    // --- Comments ------------------------------------------------------------

    /// Insert a comment. Returns [`StorageError::ForeignKey`] if the user or
    /// the post does not exist.
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StorageError>;

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StorageError>;

    // --- Edges ---------------------------------------------------------------

    /// Insert an edge. Returns [`StorageError::AlreadyExists`] if the pair is
    /// already present and [`StorageError::ForeignKey`] if either endpoint
    /// is missing.
    async fn insert_edge(&self, edge: &Edge) -> Result<(), StorageError>;

    /// Delete an edge. Returns the number of rows removed (0 or 1).
    async fn delete_edge(&self, edge: &Edge) -> Result<u64, StorageError>;

    // --- Projections ---------------------------------------------------------

    /// A user with the ids they follow, the ids following them, and the ids
    /// of posts they like, all ascending. Every part is read from the same
    /// snapshot. Returns `None` if no user has this id.
    async fn user_graph(&self, id: UserId) -> Result<Option<UserGraph>, StorageError>;

    /// A post with the users who like it (ascending by id) and its comments
    /// (oldest first, ties by ascending id), read from one snapshot. Returns
    /// `None` if no post has this id.
    async fn post_detail(&self, id: PostId) -> Result<Option<PostDetail>, StorageError>;
}
